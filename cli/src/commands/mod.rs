mod export;
mod helpers;
mod list;
mod record;
mod search;
mod sync;

pub(crate) use export::cmd_export;
pub(crate) use list::{cmd_categories, cmd_list, cmd_recent, cmd_stats};
pub(crate) use record::{cmd_add, cmd_delete, cmd_show, cmd_update};
pub(crate) use search::cmd_search;
pub(crate) use sync::{cmd_backfill, cmd_sync};
