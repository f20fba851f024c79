//! Send letters on demand.

use super::{apply_target_overrides, AppContext};
use crate::cli::SendArgs;
use crate::error::AppError;
use crate::models::LetterRequest;
use crate::services::courier::{Courier, DeliveryReport};

/// Compose and send letters to every configured destination.
///
/// `--repo`/`--to` overrides are saved to the config once the send passes
/// its local checks, so the next invocation reuses them. Theme, emoji and
/// count fall back to the config when not given.
pub async fn send(ctx: &AppContext, args: SendArgs) -> Result<DeliveryReport, AppError> {
    let mut config = ctx.load_config()?;
    let overridden = apply_target_overrides(&mut config, &args.target)?;

    let token = ctx.require_token(&config)?;
    let pool = ctx.open_db().await?;
    let courier = Courier::from_config(&config, &token, pool)?;

    let request = LetterRequest::new(
        args.message,
        args.theme.unwrap_or_else(|| config.theme.clone()),
        args.emoji.unwrap_or_else(|| config.emoji.clone()),
    );
    let count = args.count.unwrap_or(config.letters_per_day);
    courier.check_send(&request, count).await?;

    if overridden {
        ctx.save_config(&config)?;
    }

    log::info!(
        "[send] Sending {} '{}' letter(s) to {} destination(s)",
        count,
        request.theme,
        courier.destinations().len()
    );

    courier.send_letters(&request, count).await
}
