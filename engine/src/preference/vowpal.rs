// Copyright 2023 Xayn AG
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, version 3.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::{Disabled, Example, Personalization, PreferenceError, PreferenceModel};
use crate::{config::Error as ConfigError, utils::serde_duration_in_config};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Configurations of the vowpal wabbit preference model.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
#[must_use]
pub struct VowpalConfig {
    binary: PathBuf,
    learning_rate: f32,
    l2: f32,
    #[serde(with = "serde_duration_in_config")]
    probe_timeout: Duration,
    #[serde(with = "serde_duration_in_config")]
    train_timeout: Duration,
    #[serde(with = "serde_duration_in_config")]
    predict_timeout: Duration,
}

impl Default for VowpalConfig {
    fn default() -> Self {
        Self {
            binary: "vw".into(),
            learning_rate: 0.1,
            l2: 0.001,
            probe_timeout: Duration::from_secs(5),
            train_timeout: Duration::from_secs(30),
            predict_timeout: Duration::from_secs(10),
        }
    }
}

impl VowpalConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.binary.as_os_str().is_empty() {
            return Err(ConfigError::Binary);
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.) {
            return Err(ConfigError::LearningRate);
        }
        if !(self.l2.is_finite() && self.l2 >= 0.) {
            return Err(ConfigError::L2);
        }
        if [self.probe_timeout, self.train_timeout, self.predict_timeout]
            .iter()
            .any(Duration::is_zero)
        {
            return Err(ConfigError::Timeout);
        }

        Ok(())
    }

    /// The path or name of the `vw` executable.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Sets the path or name of the `vw` executable.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// The learning rate of the training.
    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// The l2 regularization of the training.
    pub fn l2(&self) -> f32 {
        self.l2
    }

    /// The time limit of the availability probe.
    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// The time limit of one training.
    pub fn train_timeout(&self) -> Duration {
        self.train_timeout
    }

    /// Sets the time limit of one training.
    pub fn with_train_timeout(mut self, timeout: Duration) -> Self {
        self.train_timeout = timeout;
        self
    }

    /// The time limit of one prediction.
    pub fn predict_timeout(&self) -> Duration {
        self.predict_timeout
    }

    /// Sets the time limit of one prediction.
    pub fn with_predict_timeout(mut self, timeout: Duration) -> Self {
        self.predict_timeout = timeout;
        self
    }
}

/// Runs a command to completion, the child is killed once the timeout elapses.
fn run(command: &mut Command, timeout: Duration) -> Result<(), PreferenceError> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return if status.success() {
                Ok(())
            } else {
                Err(PreferenceError::Status(status))
            };
        }
        if start.elapsed() > timeout {
            child.kill().ok();
            child.wait().ok();
            return Err(PreferenceError::Timeout(timeout));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Preference models backed by the external `vw` executable.
///
/// The executable is probed once on creation. Each session works in its own temporary directory,
/// which holds the training examples, the model and the predictions of one diversification call.
#[derive(Debug)]
pub struct VowpalWabbit {
    config: VowpalConfig,
    available: bool,
}

impl VowpalWabbit {
    /// Probes the executable and creates the backend.
    ///
    /// A missing or broken executable isn't an error, the backend is unavailable then.
    pub fn new(config: VowpalConfig) -> Self {
        let available = match run(
            Command::new(&config.binary).arg("--version"),
            config.probe_timeout,
        ) {
            Ok(()) => true,
            Err(error) => {
                warn!(
                    %error,
                    binary = %config.binary.display(),
                    "vowpal wabbit is unavailable, preferences are scored lexically",
                );
                false
            }
        };
        info!(available, binary = %config.binary.display(), "probed vowpal wabbit");

        Self { config, available }
    }
}

impl Personalization for VowpalWabbit {
    fn is_available(&self) -> bool {
        self.available
    }

    fn session(&self) -> Box<dyn PreferenceModel + '_> {
        if !self.available {
            return Box::new(Disabled);
        }

        match tempfile::Builder::new().prefix("diversify-vw-").tempdir() {
            Ok(workspace) => Box::new(Session {
                config: &self.config,
                workspace,
                trained: false,
            }),
            Err(error) => {
                warn!(%error, "failed to create the vowpal wabbit workspace");
                Box::new(Disabled)
            }
        }
    }
}

struct Session<'a> {
    config: &'a VowpalConfig,
    workspace: TempDir,
    trained: bool,
}

impl Session<'_> {
    fn file(&self, name: &str) -> PathBuf {
        self.workspace.path().join(name)
    }

    fn write_examples<'e>(
        path: &Path,
        examples: impl IntoIterator<Item = &'e Example>,
    ) -> Result<(), PreferenceError> {
        let mut writer = BufWriter::new(fs::File::create(path)?);
        for example in examples {
            writeln!(writer, "{example}")?;
        }
        writer.flush()?;

        Ok(())
    }

    fn try_train(&self, examples: &[Example]) -> Result<(), PreferenceError> {
        let training = self.file("training.vw");
        Self::write_examples(&training, examples)?;

        run(
            Command::new(&self.config.binary)
                .arg(&training)
                .arg("--final_regressor")
                .arg(self.file("model.vw"))
                .args(["--loss_function", "squared", "--learning_rate"])
                .arg(self.config.learning_rate.to_string())
                .arg("--l2")
                .arg(self.config.l2.to_string())
                .args(["--interactions", "ce", "--quiet"]),
            self.config.train_timeout,
        )
    }
}

impl PreferenceModel for Session<'_> {
    fn train(&mut self, examples: &[Example]) -> bool {
        match self.try_train(examples) {
            Ok(()) => {
                self.trained = true;
                info!(examples = examples.len(), "trained the preference model");
            }
            Err(error) => warn!(%error, "failed to train the preference model"),
        }
        self.trained
    }

    fn predict(&self, example: &Example) -> Result<f32, PreferenceError> {
        if !self.trained {
            return Err(PreferenceError::Untrained);
        }

        let test = self.file("test.vw");
        let predictions = self.file("predictions.txt");
        Self::write_examples(&test, [example])?;
        run(
            Command::new(&self.config.binary)
                .arg(&test)
                .arg("--initial_regressor")
                .arg(self.file("model.vw"))
                .arg("--predictions")
                .arg(&predictions)
                .arg("--quiet"),
            self.config.predict_timeout,
        )?;

        let raw = fs::read_to_string(&predictions)?;
        let prediction = raw
            .split_whitespace()
            .next()
            .and_then(|value| value.parse::<f32>().ok())
            .ok_or_else(|| PreferenceError::Prediction(raw.trim().to_string()))?;
        debug!(prediction, "predicted preference");

        Ok(prediction)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::fs::PermissionsExt;

    use diversify_test_utils::assert_approx_eq;

    use super::*;

    /// Writes an executable script which stands in for `vw`.
    fn fake_vw(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("vw");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        // concurrent forks of other tests may briefly hold the script open for writing
        while Command::new(&path)
            .arg("--version")
            .output()
            .is_err_and(|error| error.raw_os_error() == Some(26))
        {
            thread::sleep(POLL_INTERVAL);
        }
        path
    }

    const WORKING_VW: &str = r#"
predictions=""
while [ $# -gt 0 ]; do
    case "$1" in
        --version) echo "9.8.0"; exit 0;;
        --final_regressor) echo "model" > "$2"; shift;;
        --predictions) predictions="$2"; shift;;
    esac
    shift
done
if [ -n "$predictions" ]; then echo "0.25" > "$predictions"; fi"#;

    fn examples() -> Vec<Example> {
        vec![
            Example {
                reward: Some(1.),
                context: vec!["pref_thai".into()],
                features: vec!["name_len:4".into()],
            };
            3
        ]
    }

    #[test]
    fn test_config_validation() {
        VowpalConfig::default().validate().unwrap();
        assert!(matches!(
            VowpalConfig::default().with_binary("").validate(),
            Err(ConfigError::Binary),
        ));
        assert!(matches!(
            VowpalConfig::default()
                .with_predict_timeout(Duration::ZERO)
                .validate(),
            Err(ConfigError::Timeout),
        ));
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let vowpal =
            VowpalWabbit::new(VowpalConfig::default().with_binary(dir.path().join("missing")));
        assert!(!vowpal.is_available());
        assert!(!vowpal.session().is_enabled());
    }

    #[test]
    fn test_train_and_predict() {
        let dir = TempDir::new().unwrap();
        let vowpal =
            VowpalWabbit::new(VowpalConfig::default().with_binary(fake_vw(&dir, WORKING_VW)));
        assert!(vowpal.is_available());

        let mut session = vowpal.session();
        assert!(session.is_enabled());
        assert!(matches!(
            session.predict(&examples()[0]),
            Err(PreferenceError::Untrained),
        ));
        assert!(session.train(&examples()));
        assert_approx_eq!(f32, session.predict(&examples()[0]).unwrap(), 0.25);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let dir = TempDir::new().unwrap();
        let vowpal =
            VowpalWabbit::new(VowpalConfig::default().with_binary(fake_vw(&dir, WORKING_VW)));

        let mut trained = vowpal.session();
        assert!(trained.train(&examples()));
        let untrained = vowpal.session();
        assert!(matches!(
            untrained.predict(&examples()[0]),
            Err(PreferenceError::Untrained),
        ));
    }

    #[test]
    fn test_failed_training() {
        let dir = TempDir::new().unwrap();
        let binary = fake_vw(&dir, r#"[ "$1" = "--version" ] && exit 0; exit 3"#);
        let vowpal = VowpalWabbit::new(VowpalConfig::default().with_binary(binary));
        assert!(vowpal.is_available());

        let mut session = vowpal.session();
        assert!(!session.train(&examples()));
        assert!(matches!(
            session.predict(&examples()[0]),
            Err(PreferenceError::Untrained),
        ));
    }

    #[test]
    fn test_training_timeout() {
        let dir = TempDir::new().unwrap();
        let binary = fake_vw(&dir, r#"[ "$1" = "--version" ] && exit 0; sleep 5"#);
        let vowpal = VowpalWabbit::new(
            VowpalConfig::default()
                .with_binary(binary)
                .with_train_timeout(Duration::from_millis(100)),
        );

        let start = Instant::now();
        assert!(!vowpal.session().train(&examples()));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_unparsable_prediction() {
        let dir = TempDir::new().unwrap();
        let binary = fake_vw(
            &dir,
            r#"while [ $# -gt 0 ]; do
                [ "$1" = "--predictions" ] && echo "nope" > "$2"
                shift
            done"#,
        );
        let vowpal = VowpalWabbit::new(VowpalConfig::default().with_binary(binary));

        let mut session = vowpal.session();
        assert!(session.train(&examples()));
        assert!(matches!(
            session.predict(&examples()[0]),
            Err(PreferenceError::Prediction(raw)) if raw == "nope",
        ));
    }
}
