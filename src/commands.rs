//! Execute parsed actions against the app
//!
//! Each action returns the text printed to the user on success.

use crate::app::App;
use crate::cli::{Action, ChannelSide, ConnectionAction, PowerAction, SceneAction};
use crate::codec::Encoding;
use crate::error::Result;
use crate::sender::Delivery;
use crate::state::{ConnectionPatch, ConnectionSettings};
use crate::transport::TransportKind;
use std::fmt::Write;

/// True when the action writes to the switcher
pub fn needs_transport(action: &Action) -> bool {
    match action {
        Action::Scene { action } => matches!(
            action,
            SceneAction::Save { .. } | SceneAction::Call { .. }
        ),
        Action::Power { action } => !matches!(action, PowerAction::Set { .. }),
        Action::Layout { .. }
        | Action::Connection { .. }
        | Action::Ports
        | Action::Label { .. }
        | Action::Channels { .. } => false,
        _ => true,
    }
}

pub async fn execute(app: &mut App, action: Action) -> Result<String> {
    match action {
        Action::Send { command, hex } => {
            let text = command.join(" ");
            let delivery = app.send_raw(&text, Encoding::from_hex_flag(hex)).await?;
            Ok(sent(&delivery))
        }
        Action::Switch { input, outputs } => app.switch(input, outputs).await.map(|d| sent(&d)),
        Action::SwitchAll { input } => app.switch_all(input).await.map(|d| sent(&d)),
        Action::Scene { action } => scene(app, action).await,
        Action::Splice { tiles } => {
            let group_id = app.splice(tiles).await?;
            Ok(format!("Spliced group {}", group_id))
        }
        Action::Unsplice => Ok(if app.unsplice().await? {
            "All groups cancelled".to_string()
        } else {
            "No spliced groups".to_string()
        }),
        Action::Layout { rows, cols } => {
            app.set_layout(rows, cols)?;
            Ok(format!("Layout {}x{}", rows, cols))
        }
        Action::Osd { state } => app.set_osd(state.is_on()).await.map(|d| sent(&d)),
        Action::Buzzer { state } => app.set_buzzer(state.is_on()).await.map(|d| sent(&d)),
        Action::Resolution { value } => {
            app.set_resolution(value).await?;
            Ok(format!("Resolution {} ({})", value.token(), value.label()))
        }
        Action::Reset => app.factory_reset().await.map(|d| sent(&d)),
        Action::Power { action } => match action {
            PowerAction::On => app.power(true).await.map(|d| sent(&d)),
            PowerAction::Off => app.power(false).await.map(|d| sent(&d)),
            PowerAction::Set { on, off } => {
                app.set_power_commands(&on, &off)?;
                Ok("Power commands saved".to_string())
            }
        },
        Action::Connection { action } => connection(app, action),
        Action::Ports => {
            let ports = app.list_ports()?;
            if ports.is_empty() {
                return Ok("No serial ports found".to_string());
            }
            Ok(ports
                .iter()
                .map(|p| format!("{}\t{}", p.id, p.display_name))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        Action::Test => app.test().await.map(|d| sent(&d)),
        Action::Label { side, id, label } => {
            let label = label.join(" ");
            match side {
                ChannelSide::Input => app.rename_input(id, &label)?,
                ChannelSide::Output => app.rename_output(id, &label)?,
            }
            Ok("Label saved".to_string())
        }
        Action::Channels { count } => {
            app.set_channel_count(count)?;
            Ok(format!("Showing {} channels", count))
        }
    }
}

fn sent(delivery: &Delivery) -> String {
    format!("Sent {} bytes via {}", delivery.bytes, delivery.transport)
}

async fn scene(app: &mut App, action: SceneAction) -> Result<String> {
    match action {
        SceneAction::Save { id, name } => {
            let id = app.save_scene(id, name.as_deref()).await?;
            Ok(format!("Scene {} saved", id))
        }
        SceneAction::Call { id } => {
            app.call_scene(id).await?;
            Ok(format!("Scene {} called", id))
        }
        SceneAction::Rename { id, name } => {
            app.rename_scene(id, &name.join(" "))?;
            Ok(format!("Scene {} renamed", id))
        }
        SceneAction::Delete { id } => {
            app.delete_scene(id)?;
            Ok(format!("Scene {} deleted", id))
        }
        SceneAction::DeleteAll => {
            let count = app.delete_all_scenes()?;
            Ok(format!("{} scenes deleted", count))
        }
        SceneAction::List => {
            if app.scenes().is_empty() {
                return Ok("No scenes".to_string());
            }
            let mut out = String::new();
            for scene in app.scenes() {
                let _ = writeln!(
                    out,
                    "{:>2}  {:<16} {}  {}",
                    scene.id,
                    scene.name,
                    scene.created_display(),
                    scene.path_summary()
                );
            }
            Ok(out.trim_end().to_string())
        }
    }
}

fn connection(app: &mut App, action: ConnectionAction) -> Result<String> {
    match action {
        ConnectionAction::Show => Ok(describe_connection(&app.connection())),
        ConnectionAction::Set {
            transport,
            ip,
            port,
            udp_ip,
            udp_port,
            tcp_ip,
            tcp_port,
            serial_port,
        } => {
            let settings = app.update_connection(ConnectionPatch {
                active_type: transport,
                ip,
                port,
                udp_ip,
                udp_port,
                tcp_ip,
                tcp_port,
                serial_port,
                serial_connected: None,
            })?;
            Ok(describe_connection(&settings))
        }
        ConnectionAction::Segment { index, value } => {
            let settings = app.set_ip_segment(index, &value)?;
            Ok(describe_connection(&settings))
        }
    }
}

/// Multi-line summary of the connection registry
pub fn describe_connection(settings: &ConnectionSettings) -> String {
    let active = |kind: TransportKind| if settings.active_type == kind { "*" } else { " " };
    let serial = if settings.serial_port.is_empty() {
        "(none)".to_string()
    } else {
        settings.serial_port.clone()
    };
    format!(
        "{} UDP     {}:{}\n{} TCP     {}:{}\n{} Serial  {} [{}]",
        active(TransportKind::Udp),
        settings.udp_ip,
        settings.udp_port,
        active(TransportKind::Tcp),
        settings.tcp_ip,
        settings.tcp_port,
        active(TransportKind::Serial),
        serial,
        if settings.serial_connected {
            "connected"
        } else {
            "disconnected"
        }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Toggle;

    #[test]
    fn test_needs_transport() {
        assert!(needs_transport(&Action::Test));
        assert!(needs_transport(&Action::Osd { state: Toggle::On }));
        assert!(needs_transport(&Action::Scene {
            action: SceneAction::Call { id: 1 }
        }));
        assert!(!needs_transport(&Action::Scene {
            action: SceneAction::List
        }));
        assert!(!needs_transport(&Action::Ports));
        assert!(!needs_transport(&Action::Power {
            action: PowerAction::Set {
                on: String::new(),
                off: String::new()
            }
        }));
    }

    #[test]
    fn test_describe_connection_marks_active() {
        let text = describe_connection(&ConnectionSettings::default());
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("* UDP"));
        assert!(lines[0].ends_with("192.168.1.200:6789"));
        assert!(lines[2].contains("(none) [disconnected]"));
    }
}
