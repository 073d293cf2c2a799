//! Panel error types.
//!
//! Every variant is converted into a panel notice at the operation boundary;
//! they are also returned in operation reports so callers can inspect them.

use annexure_types::AssetId;

use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    #[error("upload of {file} failed: {source}")]
    Upload {
        file: String,
        #[source]
        source: StoreError,
    },
    #[error("could not update asset {id}: {source}")]
    Update {
        id: AssetId,
        #[source]
        source: StoreError,
    },
    #[error("could not delete asset {id}: {source}")]
    Delete {
        id: AssetId,
        #[source]
        source: StoreError,
    },
    #[error("asset {0} is not in this panel")]
    UnknownAsset(AssetId),
}
