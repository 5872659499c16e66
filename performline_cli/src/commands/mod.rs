//! CLI subcommand implementations.

pub mod common;
pub mod products;
pub mod tree;

use clap::Args;
use performline_lib::Query;

/// Pagination flags shared by every `list` subcommand.
#[derive(Args, Clone, Debug, Default)]
pub struct ListArgs {
    /// Maximum number of records to return
    #[arg(long)]
    pub limit: Option<usize>,

    /// Number of records to skip
    #[arg(long)]
    pub offset: Option<usize>,

    /// Fetch every record individually for its full details
    #[arg(long)]
    pub autoload: bool,
}

impl ListArgs {
    pub fn apply<Q: Query>(&self, mut query: Q) -> Q {
        if let Some(limit) = self.limit {
            query = query.with_limit(limit);
        }
        if let Some(offset) = self.offset {
            query = query.with_offset(offset);
        }
        query.with_autoload(self.autoload)
    }
}
