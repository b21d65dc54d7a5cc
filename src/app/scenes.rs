//! Scene save/recall

use super::App;
use crate::codec::Command;
use crate::error::{MatrixError, Result};
use crate::sender::Delivery;
use crate::state::scenes::{self, Scene};

impl App {
    pub fn scenes(&self) -> &[Scene] {
        &self.state().scenes
    }

    pub fn next_free_scene_id(&self) -> u8 {
        scenes::next_free_id(self.scenes())
    }

    /// Snapshot the switch history as scene `id` and send `SAVE<id>`
    ///
    /// `None` picks the lowest free id. The scene is stored before the
    /// command goes out; the history is cleared only once it was sent.
    pub async fn save_scene(&mut self, id: Option<u8>, name: Option<&str>) -> Result<u8> {
        let id = id.unwrap_or_else(|| self.next_free_scene_id());
        scenes::validate_scene_id(id)?;
        if self.history.is_empty() {
            return Err(MatrixError::selection("no switches to save"));
        }

        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| scenes::default_name(id));
        let scene = Scene {
            id,
            name,
            records: self.history.records().to_vec(),
            created_at: chrono::Local::now().timestamp_millis(),
        };
        self.store.update(|state| {
            scenes::upsert(&mut state.scenes, scene);
            Ok(())
        })?;

        self.dispatch(&Command::SaveScene(id)).await?;
        self.history.clear();
        Ok(id)
    }

    /// Recall a stored scene with `CALL<id>`
    pub async fn call_scene(&mut self, id: u8) -> Result<Delivery> {
        scenes::validate_scene_id(id)?;
        if !self.scenes().iter().any(|s| s.id == id) {
            return Err(MatrixError::UnknownScene { id });
        }
        self.dispatch(&Command::CallScene(id)).await
    }

    /// Blank names fall back to the default `Scene <id>`
    pub fn rename_scene(&mut self, id: u8, name: &str) -> Result<()> {
        let name = match name.trim() {
            "" => scenes::default_name(id),
            trimmed => trimmed.to_string(),
        };
        self.store.update(|state| {
            let scene = state
                .scenes
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or(MatrixError::UnknownScene { id })?;
            scene.name = name;
            Ok(())
        })
    }

    pub fn delete_scene(&mut self, id: u8) -> Result<()> {
        self.store.update(|state| {
            let before = state.scenes.len();
            state.scenes.retain(|s| s.id != id);
            if state.scenes.len() == before {
                return Err(MatrixError::UnknownScene { id });
            }
            Ok(())
        })
    }

    /// Returns the number of scenes removed
    pub fn delete_all_scenes(&mut self) -> Result<usize> {
        self.store
            .update(|state| Ok(std::mem::take(&mut state.scenes).len()))
    }
}

#[cfg(test)]
mod tests {
    use crate::app::App;
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

    fn last_written(host: &MockSerialHost) -> Vec<u8> {
        host.written().pop().map(|(_, b)| b).unwrap_or_default()
    }

    #[tokio::test]
    async fn test_save_scene_from_history() {
        let host = MockSerialHost::with_ports(&["COM3"]);
        let mut app = serial_app(&host).await;
        app.switch(3, [1, 2]).await.unwrap();
        app.switch(4, [5]).await.unwrap();

        let id = app.save_scene(None, Some("  ")).await.unwrap();
        assert_eq!(id, 1);
        assert_eq!(last_written(&host), b"SAVE1");
        assert!(app.history().is_empty());

        let scene = &app.scenes()[0];
        assert_eq!(scene.name, "Scene 1");
        assert_eq!(scene.path_summary(), "3->1,2; 4->5");
    }

    #[tokio::test]
    async fn test_save_scene_overwrites_existing_id() {
        let host = MockSerialHost::with_ports(&["COM3"]);
        let mut app = serial_app(&host).await;

        for (id, input) in [(5, 1), (2, 2), (5, 3)] {
            app.switch(input, [1]).await.unwrap();
            app.save_scene(Some(id), Some("named")).await.unwrap();
        }

        let ids: Vec<u8> = app.scenes().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 5]);
        assert_eq!(app.scenes()[1].records[0].input_id, 3);
    }

    #[tokio::test]
    async fn test_save_scene_rejects_empty_history_and_bad_id() {
        let host = MockSerialHost::with_ports(&["COM3"]);
        let mut app = serial_app(&host).await;

        assert!(matches!(
            app.save_scene(Some(1), None).await,
            Err(MatrixError::InvalidSelection { .. })
        ));
        app.switch(1, [1]).await.unwrap();
        assert!(app.save_scene(Some(33), None).await.is_err());
        assert!(app.scenes().is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_history() {
        let host = MockSerialHost::with_ports(&["COM3"]);
        let mut app = serial_app(&host).await;
        app.switch(1, [1]).await.unwrap();

        host.set_readable(false);
        assert!(app.save_scene(Some(4), None).await.is_err());
        assert_eq!(app.history().len(), 1);
    }

    #[tokio::test]
    async fn test_call_scene() {
        let host = MockSerialHost::with_ports(&["COM3"]);
        let mut app = serial_app(&host).await;

        assert!(matches!(
            app.call_scene(7).await,
            Err(MatrixError::UnknownScene { id: 7 })
        ));

        app.switch(1, [1]).await.unwrap();
        app.save_scene(Some(7), None).await.unwrap();
        app.call_scene(7).await.unwrap();
        assert_eq!(last_written(&host), b"CALL7");
    }

    #[tokio::test]
    async fn test_rename_and_delete() {
        let host = MockSerialHost::with_ports(&["COM3"]);
        let mut app = serial_app(&host).await;
        for id in [1, 2, 3] {
            app.switch(1, [id]).await.unwrap();
            app.save_scene(Some(id), None).await.unwrap();
        }

        app.rename_scene(2, "Evening").unwrap();
        assert_eq!(app.scenes()[1].name, "Evening");
        assert!(app.rename_scene(9, "x").is_err());

        app.delete_scene(2).unwrap();
        assert!(matches!(
            app.delete_scene(2),
            Err(MatrixError::UnknownScene { id: 2 })
        ));
        assert_eq!(app.next_free_scene_id(), 2);
        assert_eq!(app.delete_all_scenes().unwrap(), 2);
        assert!(app.scenes().is_empty());
    }
}
