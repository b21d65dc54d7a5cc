//! Input to output routing

use super::App;
use crate::codec::Command;
use crate::constants::{MAX_INPUTS, MAX_OUTPUTS};
use crate::error::{MatrixError, Result};
use crate::sender::Delivery;
use crate::state::SwitchRecord;
use std::collections::BTreeSet;

fn validate_input(input: u8) -> Result<()> {
    if !(1..=MAX_INPUTS).contains(&input) {
        return Err(MatrixError::selection(format!(
            "input {} is outside 1..={}",
            input, MAX_INPUTS
        )));
    }
    Ok(())
}

impl App {
    /// Route `input` to `outputs`; recorded in the history once sent
    pub async fn switch(
        &mut self,
        input: u8,
        outputs: impl IntoIterator<Item = u8>,
    ) -> Result<Delivery> {
        validate_input(input)?;
        let outputs: BTreeSet<u8> = outputs.into_iter().collect();
        if outputs.is_empty() {
            return Err(MatrixError::selection("no output selected"));
        }
        if let Some(bad) = outputs.iter().find(|o| !(1..=MAX_OUTPUTS).contains(*o)) {
            return Err(MatrixError::selection(format!(
                "output {} is outside 1..={}",
                bad, MAX_OUTPUTS
            )));
        }

        let command = Command::Switch {
            input,
            outputs: outputs.clone(),
        };
        let delivery = self.dispatch(&command).await?;
        self.history.record(SwitchRecord {
            input_id: input,
            output_ids: outputs,
            command_text: command.to_string(),
        });
        Ok(delivery)
    }

    /// Route `input` to every shown output
    pub async fn switch_all(&mut self, input: u8) -> Result<Delivery> {
        validate_input(input)?;
        let count = self.state().channel_count;

        let command = Command::SwitchAll { input };
        let delivery = self.dispatch(&command).await?;
        self.history.record(SwitchRecord {
            input_id: input,
            output_ids: (1..=count).collect(),
            command_text: command.to_string(),
        });
        Ok(delivery)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
