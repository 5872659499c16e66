//! Call Center product: recorded calls.

use performline_api::RestClient;

use crate::error::PerformLineError;
use crate::models::Call;
use crate::query::{ListQuery, Query};

pub struct CallCenter<'a> {
    rest: &'a RestClient,
}

impl<'a> CallCenter<'a> {
    pub(crate) fn new(rest: &'a RestClient) -> Self {
        Self { rest }
    }

    pub async fn calls(&self, query: &ListQuery) -> Result<Vec<Call>, PerformLineError> {
        Ok(Call::all(self.rest, query.list_options()).await?)
    }

    pub async fn call(&self, id: i64) -> Result<Call, PerformLineError> {
        Ok(Call::get(self.rest, id).await?)
    }
}
