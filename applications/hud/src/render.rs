//! Terminal renderer
//!
//! The concrete display collaborator for desktop/dev use: formats each
//! frame as a few lines of text. Identical consecutive frames are not
//! reprinted so the 20 Hz loop stays quiet between changes.

use serde_json::Value;
use visor_link::FieldSchema;
use visor_session::{Frame, Renderer};

#[derive(Default)]
pub struct TermRenderer {
    last: Option<String>,
}

impl TermRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for TermRenderer {
    fn show(&mut self, frame: &Frame) {
        let text = format_frame(frame);
        if self.last.as_deref() == Some(text.as_str()) {
            return;
        }
        println!("{text}");
        self.last = Some(text);
    }
}

fn format_frame(frame: &Frame) -> String {
    match frame {
        Frame::Scanning => "[ SCANNING ] waiting for a link (file, remote, or demo mode)".into(),
        Frame::PinEntry {
            device,
            hint,
            digits,
            cursor,
            error,
        } => {
            let row: Vec<String> = digits
                .iter()
                .enumerate()
                .map(|(i, d)| {
                    if i == *cursor {
                        format!("[{d}]")
                    } else {
                        format!(" {d} ")
                    }
                })
                .collect();
            let mut text = format!("[ PIN ] {device}: {}", row.join(""));
            if let Some(hint) = hint {
                text.push_str(&format!("  ({hint})"));
            }
            if let Some(error) = error {
                text.push_str(&format!("\n        {error}"));
            }
            text
        }
        Frame::Connecting { device } => format!("[ CONNECTING ] {device}..."),
        Frame::Streaming { descriptor, sample } => {
            let mut text = format!(
                "[ {} ] {}",
                descriptor.display_name(),
                descriptor.meta().device_type.as_deref().unwrap_or("device")
            );
            match sample {
                Some(Value::Object(fields)) => {
                    for (name, value) in fields {
                        let schema = descriptor.meta().schema.get(name);
                        text.push_str(&format!("\n  {}", format_field(name, value, schema)));
                    }
                }
                _ => text.push_str("\n  (waiting for data)"),
            }
            text
        }
        Frame::DeviceList {
            devices,
            selected,
            active,
        } => {
            let mut text = String::from("[ DEVICES ]");
            for (i, device) in devices.iter().enumerate() {
                let marker = if i == *selected { ">" } else { " " };
                let live = if active.as_deref() == Some(device.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                text.push_str(&format!(
                    "\n {marker}{live} {} ({})",
                    device.name, device.endpoint
                ));
            }
            text
        }
        Frame::Error { message } => format!("[ ERROR ] {message}  -  confirm to dismiss"),
    }
}

/// One data field with its unit and an alert marker when it crosses the
/// device-reported thresholds.
fn format_field(name: &str, value: &Value, schema: Option<&FieldSchema>) -> String {
    let unit = schema.and_then(|s| s.unit.as_deref()).unwrap_or("");
    let alert = match (value.as_f64(), schema) {
        (Some(v), Some(s)) => {
            s.alert_above.is_some_and(|limit| v > limit)
                || s.alert_below.is_some_and(|limit| v < limit)
        }
        _ => false,
    };
    let marker = if alert { "  !" } else { "" };
    format!("{name}: {value}{unit}{marker}")
}
