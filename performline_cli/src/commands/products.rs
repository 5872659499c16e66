use anyhow::Result;
use clap::Args;
use performline_lib::{Client, ListQuery};

use super::common::{ContentAction, SimpleAction};
use crate::output::{print, OutputFormat};

#[derive(Args)]
pub struct PagesArgs {
    #[command(subcommand)]
    pub action: SimpleAction,
}

#[derive(Args)]
pub struct CallsArgs {
    #[command(subcommand)]
    pub action: SimpleAction,
}

#[derive(Args)]
pub struct ChatsArgs {
    #[command(subcommand)]
    pub action: ContentAction,
}

pub async fn run_pages(args: &PagesArgs, client: &Client, format: &OutputFormat) -> Result<()> {
    let web = client.web();
    match &args.action {
        SimpleAction::List { list } => {
            print(&web.pages(&list.apply(ListQuery::default())).await?, format)
        }
        SimpleAction::Show { id } => print(&web.page(*id).await?, format),
    }
}

pub async fn run_calls(args: &CallsArgs, client: &Client, format: &OutputFormat) -> Result<()> {
    let callcenter = client.callcenter();
    match &args.action {
        SimpleAction::List { list } => {
            print(&callcenter.calls(&list.apply(ListQuery::default())).await?, format)
        }
        SimpleAction::Show { id } => print(&callcenter.call(*id).await?, format),
    }
}

pub async fn run_chats(args: &ChatsArgs, client: &Client, format: &OutputFormat) -> Result<()> {
    let chatscout = client.chatscout();
    match &args.action {
        ContentAction::List { list, filter } => {
            print(&chatscout.chats(&filter.query(list)).await?, format)
        }
        ContentAction::Show { id } => print(&chatscout.chat(*id).await?, format),
    }
}
