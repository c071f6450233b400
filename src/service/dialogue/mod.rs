pub mod model;

use std::sync::Arc;

use teloxide::dispatching::dialogue::{ErasedStorage, InMemStorage, Storage};

use crate::error::BotResult;
use model::DialogueState;

pub struct DialogueService;

impl DialogueService {
    pub async fn get_dialogue_storage() -> BotResult<Arc<ErasedStorage<DialogueState>>> {
        Ok(InMemStorage::new().erase())
    }
}
