//! Settings loading for ElJef tools.
//!
//! Two entry points:
//! - [`load`] folds an ordered list of configuration files into one value
//! - [`Settings`] keeps program settings in layers (defaults, system-wide
//!   file, user file) and can write a layer back to disk
//!
//! ## Configuration Layers
//!
//! Values are resolved in this priority order:
//! 1. User settings file
//! 2. System-wide settings file
//! 3. Default values
//!
//! ## Example
//!
//! ```no_run
//! use eljef_core::config::{self, Settings};
//! use eljef_core::SettingsScope;
//! use serde_json::json;
//! use std::path::Path;
//!
//! // Layer two files, the second overriding the first
//! let merged = config::load(&["defaults.yaml", "override.yaml"])?;
//!
//! // Program settings with defaults
//! let mut settings = Settings::new(
//!     json!({"color": true}),
//!     Some(Path::new("/home/me/.config/tool.yaml")),
//!     Some(Path::new("/etc/tool.yaml")),
//! )?;
//! let color: bool = settings.get_as("color")?;
//! settings.set("color", false, SettingsScope::User)?;
//! settings.save(SettingsScope::User)?;
//! # Ok::<(), eljef_core::EljefError>(())
//! ```

use eljef_types::{EljefError, Format, Result, SettingsScope};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::util::data::{self, DumpOptions};
use crate::util::fs;

/// Setting that turns on backups of settings files before they are rewritten.
pub const BACKUP_KEY: &str = "conf_back";

/// Load and merge configuration files in order.
///
/// Earlier paths are lower-precedence defaults. The format of each file is
/// inferred from its extension. An empty list yields an empty mapping.
///
/// # Errors
///
/// `NotFound` for a missing path, `UnsupportedFormat` for an unknown
/// extension and `Parse` for malformed content.
pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Value> {
    let mut merged = None;

    for path in paths {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        merged = data::merge(merged, Some(load_layer(path, format)?));
    }

    Ok(merged.unwrap_or_else(data::empty_mapping))
}

/// Like [`load`], with every file parsed as `format`.
pub fn load_with_format<P: AsRef<Path>>(paths: &[P], format: Format) -> Result<Value> {
    let mut merged = None;

    for path in paths {
        merged = data::merge(merged, Some(load_layer(path.as_ref(), format)?));
    }

    Ok(merged.unwrap_or_else(data::empty_mapping))
}

fn load_layer(path: &Path, format: Format) -> Result<Value> {
    tracing::debug!("Loading {} configuration layer {}", format, path.display());
    fs::file_read_convert(path, format, false)
}

/// Settings layer priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum ConfigLayer {
    Default = 0,
    System = 1,
    User = 2,
}

impl From<SettingsScope> for ConfigLayer {
    fn from(scope: SettingsScope) -> Self {
        match scope {
            SettingsScope::System => ConfigLayer::System,
            SettingsScope::User => ConfigLayer::User,
        }
    }
}

const LAYER_ORDER: [ConfigLayer; 3] = [ConfigLayer::Default, ConfigLayer::System, ConfigLayer::User];

/// Program settings built from defaults plus optional system-wide and user
/// YAML files.
///
/// Settings files that do not exist contribute nothing; they are created by
/// [`Settings::save`].
#[derive(Clone, Debug)]
pub struct Settings {
    layers: HashMap<ConfigLayer, Value>,
    paths: HashMap<SettingsScope, PathBuf>,
    loaded: HashSet<SettingsScope>,
    merged: Value,
}

impl Settings {
    /// Build settings from `defaults` and the optional settings files.
    ///
    /// Empty paths are treated as absent.
    ///
    /// # Errors
    ///
    /// A `Type` error when `defaults` or a settings file is not a mapping,
    /// `Parse` for a malformed settings file.
    pub fn new(defaults: Value, user_path: Option<&Path>, system_path: Option<&Path>) -> Result<Self> {
        let mut defaults = as_mapping(defaults, "defaults")?;
        if let Value::Object(map) = &mut defaults {
            map.entry(BACKUP_KEY).or_insert(Value::Bool(false));
        }

        let mut settings = Self {
            layers: HashMap::from([(ConfigLayer::Default, defaults)]),
            paths: HashMap::new(),
            loaded: HashSet::new(),
            merged: Value::Null,
        };

        for (scope, path) in [(SettingsScope::System, system_path), (SettingsScope::User, user_path)] {
            let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) else {
                continue;
            };
            settings.paths.insert(scope, path.to_path_buf());
            if path.is_file() {
                settings.layers.insert(scope.into(), Self::read(path)?);
                settings.loaded.insert(scope);
            }
        }

        settings.remerge();
        Ok(settings)
    }

    /// Read one YAML settings file. A missing file yields an empty mapping.
    pub fn read(path: impl AsRef<Path>) -> Result<Value> {
        let path = path.as_ref();
        let value = fs::file_read_convert(path, Format::Yaml, true)?;
        as_mapping(value, &path.display().to_string())
    }

    /// Whether the settings file for `scope` was found and read.
    pub fn is_loaded(&self, scope: SettingsScope) -> bool {
        self.loaded.contains(&scope)
    }

    /// Get a setting by key. Dotted keys reach into nested mappings.
    pub fn get(&self, key: &str) -> Option<&Value> {
        data::get_path(&self.merged, key)
    }

    /// Get a setting, falling back to `default` when it is missing.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).cloned().unwrap_or(default)
    }

    /// Get a setting decoded into `T`.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing key, `Json` when the value does not decode.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .get(key)
            .ok_or_else(|| EljefError::NotFound(format!("setting '{}'", key)))?;
        Ok(serde_json::from_value(value.clone())?)
    }

    /// All settings, merged.
    pub fn get_all(&self) -> &Value {
        &self.merged
    }

    /// Set a setting in the user or system layer. Dotted keys create
    /// intermediate mappings as needed.
    pub fn set(&mut self, key: &str, value: impl Serialize, scope: SettingsScope) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let layer = self
            .layers
            .entry(scope.into())
            .or_insert_with(data::empty_mapping);

        set_value_at_path(layer, key, value)?;
        self.remerge();
        Ok(())
    }

    /// Write the settings of `scope` to its file as YAML.
    ///
    /// When the layer being saved sets `conf_back` to true, the existing
    /// file is backed up first. Other layers do not affect this.
    ///
    /// # Errors
    ///
    /// `NotFound` when no path was given for `scope`.
    pub fn save(&self, scope: SettingsScope) -> Result<()> {
        let path = self.paths.get(&scope).ok_or_else(|| {
            EljefError::NotFound(format!("no settings path for {:?} scope", scope))
        })?;

        let layer = self
            .layers
            .get(&ConfigLayer::from(scope))
            .cloned()
            .unwrap_or_else(data::empty_mapping);
        let backup = layer.get(BACKUP_KEY).and_then(Value::as_bool).unwrap_or(false);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::mkdir(parent, false)?;
        }

        tracing::debug!("Saving {:?} settings to {}", scope, path.display());
        fs::file_write_convert(path, Format::Yaml, &layer, &DumpOptions::for_format(Format::Yaml), backup)
    }

    fn remerge(&mut self) {
        let layers = LAYER_ORDER
            .iter()
            .filter_map(|layer| self.layers.get(layer).cloned());
        self.merged = data::merge_layers(layers).unwrap_or_else(data::empty_mapping);
    }
}

fn as_mapping(value: Value, what: &str) -> Result<Value> {
    match value {
        Value::Null => Ok(data::empty_mapping()),
        Value::Object(_) => Ok(value),
        other => Err(EljefError::Type(format!(
            "{} must be a mapping, got {}",
            what,
            data::kind(&other)
        ))),
    }
}

fn set_value_at_path(data: &mut Value, path: &str, value: Value) -> Result<()> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(EljefError::Other(format!("Invalid setting key '{}'", path)));
    }

    let (last, parents) = match parts.split_last() {
        Some(split) => split,
        None => return Err(EljefError::Other("Empty setting key".to_string())),
    };

    let mut current = data;
    for part in parents {
        current = object_mut(current)
            .entry(part.to_string())
            .or_insert_with(data::empty_mapping);
    }
    object_mut(current).insert(last.to_string(), value);

    Ok(())
}

/// Borrow `value` as a mapping, replacing it with an empty one if it holds
/// anything else.
fn object_mut(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = data::empty_mapping();
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with a mapping"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, data: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn test_load_single_file_equals_direct_parse() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "defaults.yaml", "a:\n  x: 1\n  y: [1, 2]\nb: text\n");

        let loaded = load(&[&path]).unwrap();
        let direct = data::loads(&std::fs::read_to_string(&path).unwrap(), Format::Yaml).unwrap();
        assert_eq!(loaded, direct);
    }

    #[test]
    fn test_load_layers_equal_merge() {
        let dir = TempDir::new().unwrap();
        let defaults = write(&dir, "defaults.yaml", "a:\n  x: 1\n  y: 2\nlist: [1, 2, 3]\n");
        let overrides = write(&dir, "override.yaml", "a:\n  y: 3\n");

        let loaded = load(&[&defaults, &overrides]).unwrap();
        let want = data::deep_merge(
            fs::file_read_convert(&defaults, Format::Yaml, false).unwrap(),
            fs::file_read_convert(&overrides, Format::Yaml, false).unwrap(),
        );
        assert_eq!(loaded, want);
        assert_eq!(loaded, json!({"a": {"x": 1, "y": 3}, "list": [1, 2, 3]}));
    }

    #[test]
    fn test_load_mixed_formats() {
        let dir = TempDir::new().unwrap();
        let yaml = write(&dir, "base.yml", "app:\n  name: base\n  port: 80\n");
        let xml = write(&dir, "site.xml", "<app><name>site</name></app>");

        let loaded = load(&[yaml, xml]).unwrap();
        assert_eq!(loaded, json!({"app": {"name": "site", "port": 80}}));
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.yaml");
        assert!(matches!(load(&[&missing]), Err(EljefError::NotFound(_))));

        let bad = write(&dir, "bad.yaml", "key: [unclosed");
        assert!(matches!(load(&[&bad]), Err(EljefError::Parse { .. })));

        let unknown = write(&dir, "settings.ini", "a=b");
        assert!(matches!(load(&[&unknown]), Err(EljefError::UnsupportedFormat(_))));

        let empty: [&Path; 0] = [];
        assert_eq!(load(&empty).unwrap(), json!({}));
    }

    #[test]
    fn test_load_with_format() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.conf", "name=a\nport=1");
        let b = write(&dir, "b.conf", "port=2");
        let loaded = load_with_format(&[a, b], Format::Kv).unwrap();
        assert_eq!(loaded, json!({"name": "a", "port": "2"}));
    }

    #[test]
    fn test_settings_files_dont_exist() {
        let dir = TempDir::new().unwrap();
        let user = dir.path().join("user.yaml");
        let settings = Settings::new(json!({"test": "test"}), Some(user.as_path()), Some(Path::new(""))).unwrap();

        assert_eq!(*settings.get_all(), json!({"test": "test", "conf_back": false}));
        assert!(!settings.is_loaded(SettingsScope::User));
        assert!(!settings.is_loaded(SettingsScope::System));
    }

    #[test]
    fn test_settings_precedence() {
        let dir = TempDir::new().unwrap();
        let system = write(&dir, "system.yaml", "{'sys': 'sys', 'shared': 'system'}");
        let user = write(&dir, "user.yaml", "{'user': 'user', 'shared': 'user'}");

        let settings = Settings::new(json!({"test": "test", "shared": "default"}), Some(user.as_path()), Some(system.as_path())).unwrap();

        let want = json!({
            "test": "test",
            "sys": "sys",
            "user": "user",
            "shared": "user",
            "conf_back": false
        });
        assert_eq!(*settings.get_all(), want);
        assert!(settings.is_loaded(SettingsScope::User));
        assert!(settings.is_loaded(SettingsScope::System));
    }

    #[test]
    fn test_settings_get() {
        let settings = Settings::new(json!({"test": "test", "nested": {"n": 5}}), None, None).unwrap();

        assert_eq!(settings.get("test"), Some(&json!("test")));
        assert_eq!(settings.get("missing"), None);
        assert_eq!(settings.get_or("missing", json!(9)), json!(9));
        assert_eq!(settings.get_as::<u32>("nested.n").unwrap(), 5);
        assert!(matches!(settings.get_as::<u32>("missing"), Err(EljefError::NotFound(_))));
        assert!(matches!(settings.get_as::<u32>("test"), Err(EljefError::Json(_))));
    }

    #[test]
    fn test_settings_rejects_non_mapping() {
        let dir = TempDir::new().unwrap();
        let user = write(&dir, "user.yaml", "- a\n- b\n");
        assert!(matches!(Settings::new(json!({}), Some(user.as_path()), None), Err(EljefError::Type(_))));
        assert!(matches!(Settings::new(json!([1]), None, None), Err(EljefError::Type(_))));
    }

    #[test]
    fn test_settings_set_and_save() {
        let dir = TempDir::new().unwrap();
        let user = dir.path().join("conf").join("user.yaml");

        let mut settings = Settings::new(json!({"color": true}), Some(user.as_path()), None).unwrap();
        settings.set("color", false, SettingsScope::User).unwrap();
        settings.set("window.width", 80, SettingsScope::User).unwrap();
        assert_eq!(settings.get("color"), Some(&json!(false)));
        assert_eq!(settings.get("window.width"), Some(&json!(80)));

        settings.save(SettingsScope::User).unwrap();
        assert_eq!(Settings::read(&user).unwrap(), json!({"color": false, "window": {"width": 80}}));

        assert!(matches!(settings.save(SettingsScope::System), Err(EljefError::NotFound(_))));
        assert!(settings.set("a..b", 1, SettingsScope::User).is_err());
    }

    #[test]
    fn test_settings_save_with_backup() {
        let dir = TempDir::new().unwrap();
        let user = write(&dir, "user.yaml", "conf_back: true\nname: old\n");

        let mut settings = Settings::new(json!({"name": "default"}), Some(user.as_path()), None).unwrap();
        settings.set("name", "new", SettingsScope::User).unwrap();
        settings.save(SettingsScope::User).unwrap();

        let backup = dir.path().join("user.yaml.bak");
        assert_eq!(Settings::read(&backup).unwrap(), json!({"conf_back": true, "name": "old"}));
        assert_eq!(Settings::read(&user).unwrap(), json!({"conf_back": true, "name": "new"}));
    }

    #[test]
    fn test_settings_backup_flag_is_per_scope() {
        let dir = TempDir::new().unwrap();
        let system = write(&dir, "system.yaml", "conf_back: true\n");
        let user = write(&dir, "user.yaml", "name: old\n");

        let mut settings =
            Settings::new(json!({}), Some(user.as_path()), Some(system.as_path())).unwrap();
        assert_eq!(settings.get("conf_back"), Some(&json!(true)));

        settings.set("name", "new", SettingsScope::User).unwrap();
        settings.save(SettingsScope::User).unwrap();
        assert!(!dir.path().join("user.yaml.bak").exists());

        settings.set("name", "sys", SettingsScope::System).unwrap();
        settings.save(SettingsScope::System).unwrap();
        assert!(dir.path().join("system.yaml.bak").exists());
    }

    #[test]
    fn test_settings_read() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "t.yaml", "{'test': 'test'}");
        assert_eq!(Settings::read(&path).unwrap(), json!({"test": "test"}));
        assert_eq!(Settings::read(dir.path().join("none.yaml")).unwrap(), json!({}));
    }
}
