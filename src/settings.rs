use crate::calibration::{CalibrationState, KeyTrim, NormalizationReport, RawCalibration};
use crate::config::Config;
use crate::consts::KEY_COUNT;
use crate::{KeylightError, KlResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// The persisted settings file: physical configuration plus raw calibration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsDocument {
    pub config: Config,
    pub calibration: RawCalibration,
}

impl SettingsDocument {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> KlResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> KlResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn snapshot(&self) -> (Config, CalibrationState, NormalizationReport) {
        let (state, report) = self.calibration.normalize(self.config.strip.total_leds);
        (self.config.clone(), state, report)
    }
}

/// Change notification sent to subscribers after a mutation has been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsEvent {
    OffsetChanged { key: usize, value: Option<i32> },
    TrimChanged { key: usize, trim: Option<KeyTrim> },
    OverrideChanged { key: usize, leds: Option<Vec<usize>> },
    RangeChanged { start_led: usize, end_led: usize },
    ConfigChanged,
}

pub struct SettingsStore {
    doc: RwLock<SettingsDocument>,
    path: Option<PathBuf>,
    subscribers: Mutex<Vec<Sender<SettingsEvent>>>,
}

impl SettingsStore {
    pub fn in_memory(doc: SettingsDocument) -> Self {
        Self {
            doc: RwLock::new(doc),
            path: None,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Opens a file-backed store. A missing file starts from defaults and is created on
    /// the first mutation.
    pub fn open<P: AsRef<Path>>(path: P) -> KlResult<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = if path.exists() {
            let doc = SettingsDocument::load_from_file(&path)?;
            info!("Loaded settings from {}", path.display());
            doc
        } else {
            info!("No settings at {}; using defaults", path.display());
            SettingsDocument::default()
        };
        Ok(Self {
            doc: RwLock::new(doc),
            path: Some(path),
            subscribers: Mutex::new(Vec::new()),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn subscribe(&self) -> Receiver<SettingsEvent> {
        let (tx, rx) = channel();
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }
        rx
    }

    pub fn document(&self) -> KlResult<SettingsDocument> {
        Ok(self.read()?.clone())
    }

    pub fn snapshot(&self) -> KlResult<(Config, CalibrationState, NormalizationReport)> {
        Ok(self.read()?.snapshot())
    }

    pub fn set_key_offset(&self, key: usize, offset: i32) -> KlResult<()> {
        check_key(key)?;
        self.mutate(
            |doc| doc.calibration.set_offset(key, offset),
            SettingsEvent::OffsetChanged {
                key,
                value: Some(offset),
            },
        )
    }

    pub fn delete_key_offset(&self, key: usize) -> KlResult<()> {
        check_key(key)?;
        self.mutate(
            |doc| {
                doc.calibration.remove_offset(key);
            },
            SettingsEvent::OffsetChanged { key, value: None },
        )
    }

    pub fn set_key_trim(&self, key: usize, trim: KeyTrim) -> KlResult<()> {
        check_key(key)?;
        if trim.is_zero() {
            return self.delete_key_trim(key);
        }
        self.mutate(
            |doc| doc.calibration.set_trim(key, trim),
            SettingsEvent::TrimChanged {
                key,
                trim: Some(trim),
            },
        )
    }

    pub fn delete_key_trim(&self, key: usize) -> KlResult<()> {
        check_key(key)?;
        self.mutate(
            |doc| {
                doc.calibration.remove_trim(key);
            },
            SettingsEvent::TrimChanged { key, trim: None },
        )
    }

    /// An empty list clears the override.
    pub fn set_key_override(&self, key: usize, leds: &[usize]) -> KlResult<()> {
        check_key(key)?;
        if leds.is_empty() {
            return self.clear_key_override(key);
        }
        let unique = unique_leds(leds);
        self.mutate(
            |doc| doc.calibration.set_override(key, &unique),
            SettingsEvent::OverrideChanged {
                key,
                leds: Some(unique.clone()),
            },
        )
    }

    pub fn clear_key_override(&self, key: usize) -> KlResult<()> {
        check_key(key)?;
        self.mutate(
            |doc| {
                doc.calibration.remove_override(key);
            },
            SettingsEvent::OverrideChanged { key, leds: None },
        )
    }

    /// Adds `led` to the key's override, or removes it if already present. `seed` is
    /// used as the starting list when the key has no override yet. Removing the last
    /// LED clears the override.
    pub fn toggle_override_led(&self, key: usize, led: usize, seed: &[usize]) -> KlResult<Vec<usize>> {
        check_key(key)?;
        self.update(|doc| {
            let (_, state, _) = doc.snapshot();
            let mut leds = match &state.key_led_overrides[key] {
                Some(current) => current.clone(),
                None => unique_leds(seed),
            };

            if let Some(pos) = leds.iter().position(|&l| l == led) {
                leds.remove(pos);
            } else {
                leds.push(led);
            }

            if leds.is_empty() {
                doc.calibration.remove_override(key);
                (leds, SettingsEvent::OverrideChanged { key, leds: None })
            } else {
                doc.calibration.set_override(key, &leds);
                let event = SettingsEvent::OverrideChanged {
                    key,
                    leds: Some(leds.clone()),
                };
                (leds, event)
            }
        })
    }

    pub fn set_led_range(&self, start_led: usize, end_led: usize) -> KlResult<()> {
        let (start_led, end_led) = (start_led.min(end_led), start_led.max(end_led));
        self.mutate(
            |doc| doc.calibration.set_range(start_led, end_led),
            SettingsEvent::RangeChanged { start_led, end_led },
        )
    }

    pub fn set_config(&self, config: Config) -> KlResult<()> {
        config.validate()?;
        self.mutate(|doc| doc.config = config, SettingsEvent::ConfigChanged)
    }

    fn read(&self) -> KlResult<std::sync::RwLockReadGuard<'_, SettingsDocument>> {
        self.doc
            .read()
            .map_err(|_| KeylightError::Settings("settings lock poisoned".to_string()))
    }

    fn mutate<F>(&self, apply: F, event: SettingsEvent) -> KlResult<()>
    where
        F: FnOnce(&mut SettingsDocument),
    {
        self.update(|doc| {
            apply(doc);
            ((), event)
        })
    }

    /// Read-modify-write under one write lock. The edit is made on a copy and only
    /// becomes visible once it has been persisted.
    fn update<T, F>(&self, apply: F) -> KlResult<T>
    where
        F: FnOnce(&mut SettingsDocument) -> (T, SettingsEvent),
    {
        let mut doc = self
            .doc
            .write()
            .map_err(|_| KeylightError::Settings("settings lock poisoned".to_string()))?;

        let mut next = doc.clone();
        let (value, event) = apply(&mut next);
        self.persist(&next)?;
        *doc = next;

        debug!("Settings changed: {:?}", event);
        self.broadcast(event);
        Ok(value)
    }

    fn persist(&self, doc: &SettingsDocument) -> KlResult<()> {
        match &self.path {
            Some(path) => doc.save_to_file(path),
            None => Ok(()),
        }
    }

    fn broadcast(&self, event: SettingsEvent) {
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }
}

fn unique_leds(leds: &[usize]) -> Vec<usize> {
    let mut unique = Vec::with_capacity(leds.len());
    for &led in leds {
        if !unique.contains(&led) {
            unique.push(led);
        }
    }
    unique
}

fn check_key(key: usize) -> KlResult<()> {
    if key < KEY_COUNT {
        Ok(())
    } else {
        Err(KeylightError::InvalidKey(format!(
            "key index {} is outside 0..{}",
            key,
            KEY_COUNT - 1
        )))
    }
}
