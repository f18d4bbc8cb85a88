//! Live push-event streaming.

use owo_colors::OwoColorize;

use galileo_core::{CoreError, EventKind, Galileo, GalileoEvent};

use crate::cli::{EventsArgs, EventsCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Format one event as a single output line.
fn format_event(event: &GalileoEvent, json: bool, color: bool) -> String {
    let kind = event.kind();
    let payload = event.payload_json();
    if json {
        return serde_json::json!({
            "event": kind.name(),
            "category": kind.category().to_string(),
            "payload": payload,
        })
        .to_string();
    }

    let time = chrono::Utc::now().format("%H:%M:%S").to_string();
    let category = kind.category().to_string();
    if color {
        format!(
            "{} {:<8} {} {payload}",
            time.dimmed(),
            category.cyan(),
            kind.name().bold()
        )
    } else {
        format!("{time} {category:<8} {} {payload}", kind.name())
    }
}

pub async fn handle(galileo: &Galileo, args: EventsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        EventsCommand::Watch { category, event } => {
            let json = matches!(global.output, OutputFormat::Json | OutputFormat::JsonCompact);
            let color = !json && output::should_color(&global.color);
            let quiet = global.quiet;
            let printer = move |e: &GalileoEvent| {
                output::print_output(&format_event(e, json, color), quiet);
            };

            let registry = galileo.events();
            let mut watched = 0_usize;
            for cat in &category {
                registry.on_category(*cat, printer);
                watched += cat.kinds().count();
            }
            for name in &event {
                registry.on_name(name, printer).map_err(CoreError::from)?;
                watched += 1;
            }
            if category.is_empty() && event.is_empty() {
                for kind in EventKind::ALL {
                    registry.on_kind(*kind, printer);
                }
                watched = EventKind::ALL.len();
            }

            galileo.open_events().await?;
            output::notice(
                &format!("Watching {watched} event type(s); press Ctrl-C to stop"),
                global.quiet,
            );
            tracing::debug!(watched, "event stream open");

            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result?;
                    Ok(())
                }
                () = galileo.events_closed() => Err(CliError::ConnectionFailed {
                    url: galileo.backend().to_string(),
                    reason: "event channel closed and could not reconnect".into(),
                }),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> GalileoEvent {
        let kind = EventKind::from_name("station_admin_destroyed").unwrap();
        GalileoEvent::decode(kind, &[json!({"stationid": "st-1"})]).unwrap()
    }

    #[test]
    fn json_line_carries_name_category_and_payload() {
        let line = format_event(&sample(), true, false);
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["event"], "station_admin_destroyed");
        assert_eq!(parsed["category"], "stations");
        assert_eq!(parsed["payload"]["stationid"], "st-1");
    }

    #[test]
    fn plain_line_without_color_has_no_escape_codes() {
        let line = format_event(&sample(), false, false);
        assert!(line.contains("stations"));
        assert!(line.contains("station_admin_destroyed"));
        assert!(!line.contains('\u{1b}'));
    }
}
