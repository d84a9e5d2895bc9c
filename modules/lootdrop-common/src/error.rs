use thiserror::Error;

#[derive(Error, Debug)]
pub enum LootdropError {
    #[error("Unknown storefront: {0}")]
    UnknownStorefront(String),

    #[error("Unknown locale: {0}")]
    UnknownLocale(String),

    #[error("Scan lock held: another scan is in progress")]
    ScanLockHeld,

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
