//! Splicing layout and tile groups

use super::App;
use crate::codec::Command;
use crate::error::{MatrixError, Result};
use crate::geometry::{self, TileBorders};
use crate::state::splicing::{self, SplicingGroup, SplicingSettings};
use std::collections::BTreeSet;

impl App {
    pub fn splicing_settings(&self) -> SplicingSettings {
        self.state().splicing_settings
    }

    pub fn splicing_groups(&self) -> &[SplicingGroup] {
        &self.state().splicing_groups
    }

    /// Change the grid; existing groups no longer match it and are dropped
    pub fn set_layout(&mut self, rows: u8, cols: u8) -> Result<()> {
        let settings = SplicingSettings::new(rows, cols)?;
        self.store.update(|state| {
            state.splicing_settings = settings;
            state.splicing_groups.clear();
            Ok(())
        })?;
        self.log_system(format!("Splicing layout set to {}x{}", rows, cols));
        Ok(())
    }

    /// Merge the selected tiles into one screen, returning the new group id
    pub async fn splice(&mut self, tiles: impl IntoIterator<Item = u8>) -> Result<u64> {
        let tiles: BTreeSet<u8> = tiles.into_iter().collect();
        let settings = self.splicing_settings();

        if tiles.len() < 2 {
            return Err(MatrixError::selection("select at least two screens"));
        }
        if let Some(bad) = tiles.iter().find(|t| !settings.contains(**t)) {
            return Err(MatrixError::selection(format!(
                "screen {} is outside the {}x{} grid",
                bad, settings.rows, settings.cols
            )));
        }
        if let Some(tile) = tiles
            .iter()
            .find(|t| splicing::group_of(self.splicing_groups(), **t).is_some())
        {
            return Err(MatrixError::TileAlreadySpliced { tile: *tile });
        }
        if !geometry::is_rectangle(&tiles, settings.cols) {
            return Err(MatrixError::NotRectangle);
        }

        let (start, end) = match (tiles.first(), tiles.last()) {
            (Some(start), Some(end)) => (*start, *end),
            _ => return Err(MatrixError::selection("select at least two screens")),
        };
        self.dispatch(&Command::Splice {
            start,
            end,
            cols: settings.cols,
            rows: settings.rows,
        })
        .await?;

        let now_ms = chrono::Local::now().timestamp_millis();
        self.store.update(|state| {
            let group_id = splicing::new_group_id(&state.splicing_groups, now_ms);
            state.splicing_groups.push(SplicingGroup {
                group_id,
                output_ids: tiles,
            });
            Ok(group_id)
        })
    }

    /// Cancel every group; `Ok(false)` when there was nothing to cancel
    pub async fn unsplice(&mut self) -> Result<bool> {
        if self.splicing_groups().is_empty() {
            return Ok(false);
        }

        let settings = self.splicing_settings();
        self.dispatch(&Command::Unsplice {
            start: 1,
            end: settings.last_tile(),
            cols: settings.cols,
            rows: settings.rows,
        })
        .await?;

        self.store.update(|state| {
            state.splicing_groups.clear();
            Ok(())
        })?;
        Ok(true)
    }

    /// Forget one group locally, without telling the switcher
    pub fn remove_group(&mut self, group_id: u64) -> Result<bool> {
        self.store.update(|state| {
            let before = state.splicing_groups.len();
            state.splicing_groups.retain(|g| g.group_id != group_id);
            Ok(state.splicing_groups.len() != before)
        })
    }

    /// Selecting a grouped tile selects its whole group
    pub fn expand_selection(&self, tile: u8) -> BTreeSet<u8> {
        match splicing::group_of(self.splicing_groups(), tile) {
            Some(group) => group.output_ids.clone(),
            None => BTreeSet::from([tile]),
        }
    }

    pub fn tile_borders(&self, tile: u8) -> TileBorders {
        let settings = self.splicing_settings();
        match splicing::group_of(self.splicing_groups(), tile) {
            Some(group) => {
                geometry::tile_borders(tile, &group.output_ids, settings.rows, settings.cols)
            }
            None => TileBorders::ALL_EXTERNAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::app::App;
    use crate::error::MatrixError;
    use crate::geometry::{EdgeKind, TileBorders};
    use crate::sender::{CommandSender, SenderOptions};
    use crate::state::{ConnectionPatch, Store};
    use crate::transport::mock::MockSerialHost;
    use crate::transport::TransportKind;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    async fn serial_app(host: &MockSerialHost) -> App {
        let sender = CommandSender::new(Arc::new(host.clone()), SenderOptions::default());
        let mut app = App::new(Store::ephemeral(), sender, 50);
        app.update_connection(ConnectionPatch::active_type(TransportKind::Serial))
            .unwrap();
        app.connect_serial(Some("COM3")).await.unwrap();
        app
    }

    #[tokio::test]
    async fn test_splice_sends_hex_and_records_group() {
        let host = MockSerialHost::with_ports(&["COM3"]);
        let mut app = serial_app(&host).await;

        app.splice([7, 1, 6, 2]).await.unwrap();

        let (_, bytes) = host.written().pop().unwrap();
        assert_eq!(
            bytes,
            vec![0xA5, 0x5A, 0x0B, 0xF0, 0x00, 0x0F, 0x01, 0x07, 0x05, 0x04, 0x00, 0xAA]
        );
        assert_eq!(app.splicing_groups().len(), 1);
        assert_eq!(app.expand_selection(6), BTreeSet::from([1, 2, 6, 7]));
        assert_eq!(app.expand_selection(3), BTreeSet::from([3]));
    }

    #[tokio::test]
    async fn test_splice_rejections_do_no_io() {
        let host = MockSerialHost::with_ports(&["COM3"]);
        let mut app = serial_app(&host).await;

        assert!(matches!(
            app.splice([1]).await,
            Err(MatrixError::InvalidSelection { .. })
        ));
        assert!(matches!(
            app.splice([20, 21]).await,
            Err(MatrixError::InvalidSelection { .. })
        ));
        assert!(matches!(
            app.splice([1, 2, 7]).await,
            Err(MatrixError::NotRectangle)
        ));
        assert!(host.written().is_empty());

        app.splice([1, 2]).await.unwrap();
        assert!(matches!(
            app.splice([2, 3]).await,
            Err(MatrixError::TileAlreadySpliced { tile: 2 })
        ));
        assert_eq!(host.written().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_splice_records_nothing() {
        let host = MockSerialHost::with_ports(&["COM3"]);
        let mut app = serial_app(&host).await;
        host.set_readable(false);

        assert!(app.splice([1, 2]).await.is_err());
        assert!(app.splicing_groups().is_empty());
    }

    #[tokio::test]
    async fn test_unsplice() {
        let host = MockSerialHost::with_ports(&["COM3"]);
        let mut app = serial_app(&host).await;

        assert!(!app.unsplice().await.unwrap());
        assert!(host.written().is_empty());

        app.splice([1, 2]).await.unwrap();
        assert!(app.unsplice().await.unwrap());
        let (_, bytes) = host.written().pop().unwrap();
        assert_eq!(
            bytes,
            vec![0xA5, 0x5A, 0x0C, 0xF0, 0x00, 0x00, 0x01, 0x14, 0x05, 0x04, 0x00, 0xAA]
        );
        assert!(app.splicing_groups().is_empty());
    }

    #[tokio::test]
    async fn test_layout_change_clears_groups() {
        let host = MockSerialHost::with_ports(&["COM3"]);
        let mut app = serial_app(&host).await;
        app.splice([1, 2]).await.unwrap();

        assert!(app.set_layout(9, 2).is_err());
        assert_eq!(app.splicing_groups().len(), 1);

        app.set_layout(2, 2).unwrap();
        assert!(app.splicing_groups().is_empty());
        assert_eq!(app.splicing_settings().tile_count(), 4);
    }

    #[tokio::test]
    async fn test_borders_and_remove_group() {
        let host = MockSerialHost::with_ports(&["COM3"]);
        let mut app = serial_app(&host).await;
        let group_id = app.splice([1, 2]).await.unwrap();

        let borders = app.tile_borders(1);
        assert_eq!(borders.right, EdgeKind::Internal);
        assert_eq!(borders.bottom, EdgeKind::External);
        assert_eq!(app.tile_borders(3), TileBorders::ALL_EXTERNAL);

        assert!(app.remove_group(group_id).unwrap());
        assert!(!app.remove_group(group_id).unwrap());
        assert_eq!(app.tile_borders(1), TileBorders::ALL_EXTERNAL);
    }
}
