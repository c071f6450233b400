mod callback;
mod command;
mod keyboard;
mod message;
mod payment;
mod view;

use callback::get_callback_handler;
use command::get_command_handler;
use message::{get_message_handler, handle_message_unknown};

use teloxide::{
    dispatching::{
        dialogue::{self, ErasedStorage},
        UpdateFilterExt, UpdateHandler,
    },
    dptree,
    types::Update,
};

use crate::service::dialogue::model::DialogueState;

pub fn get_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    let dialogue_tree = dialogue::enter::<Update, ErasedStorage<DialogueState>, DialogueState, _>()
        .branch(get_command_handler())
        .branch(payment::get_payment_handler())
        .branch(get_message_handler())
        .branch(get_callback_handler())
        .branch(Update::filter_message().endpoint(handle_message_unknown));

    // Pre-checkout queries carry no chat, so they stay outside the
    // dialogue subtree.
    dptree::entry()
        .branch(Update::filter_pre_checkout_query().endpoint(payment::handle_pre_checkout))
        .branch(dialogue_tree)
}
