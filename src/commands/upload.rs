//! Upload a local file.

use super::{apply_target_overrides, AppContext};
use crate::cli::UploadArgs;
use crate::error::AppError;
use crate::services::courier::{Courier, DeliveryReport};

/// Upload a file to `<folder>/<file name>` at every destination, replacing
/// existing copies.
///
/// `--repo`/`--to` overrides are saved only once the local file is known to
/// be readable.
pub async fn upload(ctx: &AppContext, args: UploadArgs) -> Result<DeliveryReport, AppError> {
    let mut config = ctx.load_config()?;
    let overridden = apply_target_overrides(&mut config, &args.target)?;
    Courier::check_upload(&args.path)?;

    let token = ctx.require_token(&config)?;
    let pool = ctx.open_db().await?;
    let courier = Courier::from_config(&config, &token, pool)?;

    if overridden {
        ctx.save_config(&config)?;
    }

    log::info!("[upload] Uploading {}", args.path.display());
    courier.upload_file(&args.path).await
}
