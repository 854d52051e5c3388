pub mod config;
pub mod logging;

pub mod asset;
pub mod cancel;
pub mod channel;
pub mod checksum;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod receipts;
pub mod record;
pub mod retry;
pub mod storage;

pub use asset::{
    Asset, AssetMetadata, DownloadOutcome, DownloadState, LocalContent, Receipt, RemoteLocator,
    UploadState,
};
pub use cancel::CancelToken;
pub use channel::{ChannelError, TransferChannel};
pub use checksum::Checksum;
pub use crypto::{CryptoError, WrappingKey};
pub use engine::{DownloadTarget, TransferEngine, TransferOptions};
pub use error::{AssetError, AssetErrorKind};
pub use record::{FieldValue, Record};
