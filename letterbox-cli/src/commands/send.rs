//! Deliver one message right away.

use super::{print_json, template_data, with_content};
use crate::SendArgs;
use crate::error::{CliError, CliResult};
use letterbox::config::Settings;
use letterbox::{DeliveryParams, Letterbox};

pub async fn run(settings: &Settings, args: SendArgs) -> CliResult<()> {
    let letterbox = Letterbox::from_settings(settings)?;
    let service = letterbox.service();

    let staged = super::jobs::stage_all(service, &args.attachments).await?;
    let params = DeliveryParams::one(
        args.to.as_str(),
        args.content.template.as_str(),
        template_data(&args.content),
    )
    .with_attachments(staged);
    let params = with_content(params, &args.content);

    let outcomes = service.send_now(params).await?;
    print_json(&outcomes)?;

    let failed = outcomes.iter().filter(|o| !o.success).count();
    if failed > 0 {
        return Err(CliError::Delivery {
            failed,
            total: outcomes.len(),
        });
    }
    Ok(())
}
