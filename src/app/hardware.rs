//! Hardware toggles, power relay and channel labels

use super::App;
use crate::codec::{Command, Encoding, Resolution};
use crate::constants::MAX_OUTPUTS;
use crate::error::{MatrixError, Result};
use crate::sender::Delivery;
use crate::state::{Channel, PowerSettings};

impl App {
    /// Cached values only change once the switcher got the command
    pub async fn set_osd(&mut self, on: bool) -> Result<Delivery> {
        let delivery = self.dispatch(&Command::Osd(on)).await?;
        self.store.update(|state| {
            state.hardware_settings.osd_enabled = on;
            Ok(())
        })?;
        Ok(delivery)
    }

    pub async fn set_buzzer(&mut self, on: bool) -> Result<Delivery> {
        let delivery = self.dispatch(&Command::Buzzer(on)).await?;
        self.store.update(|state| {
            state.hardware_settings.buzzer_enabled = on;
            Ok(())
        })?;
        Ok(delivery)
    }

    pub async fn set_resolution(&mut self, resolution: Resolution) -> Result<Delivery> {
        let delivery = self.dispatch(&Command::Resolution(resolution)).await?;
        self.store.update(|state| {
            state.hardware_settings.resolution = resolution;
            Ok(())
        })?;
        Ok(delivery)
    }

    pub async fn factory_reset(&mut self) -> Result<Delivery> {
        self.dispatch(&Command::Reset).await
    }

    // =========================================================================
    // Power
    // =========================================================================

    pub fn set_power_commands(&mut self, on_command: &str, off_command: &str) -> Result<()> {
        let power = PowerSettings::new(on_command, off_command)?;
        self.store.update(|state| {
            state.power_settings = power;
            Ok(())
        })
    }

    /// Send the stored power-on or power-off hex command
    pub async fn power(&mut self, on: bool) -> Result<Delivery> {
        let command = self
            .state()
            .power_settings
            .command(on)
            .map(str::to_string)
            .ok_or_else(|| MatrixError::ConfigValidation {
                field: "power",
                reason: format!(
                    "no power-{} command configured",
                    if on { "on" } else { "off" }
                ),
            })?;
        self.send_raw(&command, Encoding::Hex).await
    }

    // =========================================================================
    // Channels
    // =========================================================================

    pub fn rename_input(&mut self, id: u8, label: &str) -> Result<()> {
        self.store
            .update(|state| rename_channel(&mut state.input_channels, "Input", id, label))
    }

    pub fn rename_output(&mut self, id: u8, label: &str) -> Result<()> {
        self.store
            .update(|state| rename_channel(&mut state.output_channels, "Output", id, label))
    }

    /// Number of outputs shown and targeted by switch-to-all
    pub fn set_channel_count(&mut self, count: u8) -> Result<()> {
        if !(1..=MAX_OUTPUTS).contains(&count) {
            return Err(MatrixError::ConfigValidation {
                field: "channel count",
                reason: format!("{} is outside 1..={}", count, MAX_OUTPUTS),
            });
        }
        self.store.update(|state| {
            state.channel_count = count;
            Ok(())
        })
    }
}

fn rename_channel(channels: &mut [Channel], prefix: &str, id: u8, label: &str) -> Result<()> {
    let channel = channels
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| MatrixError::selection(format!("no {} channel {}", prefix, id)))?;
    channel.label = match label.trim() {
        "" => format!("{} {}", prefix, id),
        trimmed => trimmed.to_string(),
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::app::App;
    use crate::codec::Resolution;
    use crate::error::MatrixError;
    use crate::sender::{CommandSender, SenderOptions};
    use crate::state::{ConnectionPatch, Store};
    use crate::transport::mock::MockSerialHost;
    use crate::transport::TransportKind;
    use std::sync::Arc;

    async fn serial_app(host: &MockSerialHost) -> App {
        let sender = CommandSender::new(Arc::new(host.clone()), SenderOptions::default());
        let mut app = App::new(Store::ephemeral(), sender, 50);
        app.update_connection(ConnectionPatch::active_type(TransportKind::Serial))
            .unwrap();
        app.connect_serial(Some("COM3")).await.unwrap();
        app
    }

    fn written(host: &MockSerialHost) -> Vec<Vec<u8>> {
        host.written().into_iter().map(|(_, b)| b).collect()
    }

    #[tokio::test]
    async fn test_toggles_update_cache_after_send() {
        let host = MockSerialHost::with_ports(&["COM3"]);
        let mut app = serial_app(&host).await;

        app.set_osd(true).await.unwrap();
        app.set_buzzer(false).await.unwrap();
        app.set_resolution(Resolution::Res2).await.unwrap();
        app.factory_reset().await.unwrap();

        assert_eq!(
            written(&host),
            vec![
                b"OSDON".to_vec(),
                b"BUZOFF".to_vec(),
                b"RES2".to_vec(),
                b"RESET".to_vec()
            ]
        );
        let hardware = app.state().hardware_settings;
        assert!(hardware.osd_enabled);
        assert_eq!(hardware.resolution, Resolution::Res2);
    }

    #[tokio::test]
    async fn test_failed_toggle_keeps_cache() {
        let host = MockSerialHost::with_ports(&["COM3"]);
        let mut app = serial_app(&host).await;
        host.set_readable(false);

        assert!(app.set_osd(true).await.is_err());
        assert!(!app.state().hardware_settings.osd_enabled);
    }

    #[tokio::test]
    async fn test_power_commands() {
        let host = MockSerialHost::with_ports(&["COM3"]);
        let mut app = serial_app(&host).await;

        assert!(matches!(
            app.power(true).await,
            Err(MatrixError::ConfigValidation { field: "power", .. })
        ));
        assert!(app.set_power_commands("A5 XX", "").is_err());

        app.set_power_commands("A5 5A 01 AA", "A5 5A 00 AA").unwrap();
        app.power(true).await.unwrap();
        app.power(false).await.unwrap();
        assert_eq!(
            written(&host),
            vec![vec![0xA5, 0x5A, 0x01, 0xAA], vec![0xA5, 0x5A, 0x00, 0xAA]]
        );
    }

    #[test]
    fn test_channel_labels() {
        let host = MockSerialHost::default();
        let sender = CommandSender::new(Arc::new(host), SenderOptions::default());
        let mut app = App::new(Store::ephemeral(), sender, 10);

        app.rename_input(3, "Camera").unwrap();
        app.rename_output(64, " Projector ").unwrap();
        assert_eq!(app.state().input_channels[2].label, "Camera");
        assert_eq!(app.state().output_channels[63].label, "Projector");

        app.rename_input(3, "").unwrap();
        assert_eq!(app.state().input_channels[2].label, "Input 3");
        assert!(app.rename_input(41, "x").is_err());

        app.set_channel_count(16).unwrap();
        assert_eq!(app.state().channel_count, 16);
        assert!(app.set_channel_count(0).is_err());
    }
}
