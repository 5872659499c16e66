//! ChatScout product: chat transcripts.

use performline_api::RestClient;

use crate::error::PerformLineError;
use crate::models::Chat;
use crate::query::{ChatQuery, Query};

pub struct ChatScout<'a> {
    rest: &'a RestClient,
}

impl<'a> ChatScout<'a> {
    pub(crate) fn new(rest: &'a RestClient) -> Self {
        Self { rest }
    }

    pub async fn chats(&self, query: &ChatQuery) -> Result<Vec<Chat>, PerformLineError> {
        Ok(Chat::all(self.rest, query.list_options()).await?)
    }

    pub async fn chat(&self, id: i64) -> Result<Chat, PerformLineError> {
        Ok(Chat::get(self.rest, id).await?)
    }
}
