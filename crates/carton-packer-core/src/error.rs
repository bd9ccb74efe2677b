use std::time::Duration;

use thiserror::Error;

use crate::item::ItemList;

#[derive(Debug, Error)]
pub enum PackerError {
    /// An item cannot be packed into any available carton, either because of
    /// its dimensions or its weight. Carries the residual item list so the
    /// caller can inspect what was left over.
    #[error("{message}")]
    NoCartonsAvailable { message: String, items: ItemList },

    #[error("packing exceeded the timeout: spent {spent:?} of a {budget:?} budget")]
    Timeout { spent: Duration, budget: Duration },
}

pub type Result<T> = std::result::Result<T, PackerError>;
