use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use vinylvibe::clock::ManualClock;
use vinylvibe::config::Config;
use vinylvibe::engine::{EngineBuilder, EngineFacade, RecordingObserver};
use vinylvibe::providers::ScriptedProvider;
use vinylvibe::storage::MemoryStore;

#[allow(dead_code)]
pub const FOLK_TRAITS: &str = r#"{"genre":["folk","americana"],"mood":"wistful","tempo":60,"lyricsTheme":"travel","instruments":["acoustic guitar","harmonica"]}"#;

#[allow(dead_code)]
pub const FASTER_FOLK_TRAITS: &str = r#"{"genre":["folk","americana"],"mood":"upbeat","tempo":75,"lyricsTheme":"travel","instruments":["acoustic guitar","banjo"]}"#;

#[allow(dead_code)]
pub const FOLK_SONGS: &str = r#"[
  {"title":"Wagon Wheel","artist":"Old Crow Medicine Show","reason":"Road trip staple"},
  {"title":"Fast Car","artist":"Tracy Chapman","reason":"Driving away"},
  {"title":"Ho Hey","artist":"The Lumineers","reason":"Singalong folk"},
  {"title":"Home","artist":"Edward Sharpe & The Magnetic Zeros","reason":"Travel theme"},
  {"title":"Take Me Home, Country Roads","artist":"John Denver","reason":"Classic road song"}
]"#;

/// Provider that routes on the prompt opener
#[allow(dead_code)]
pub fn folk_provider() -> ScriptedProvider {
    ScriptedProvider::new(|prompt| {
        if prompt.starts_with("You are a music expert") {
            Ok(FOLK_TRAITS.to_string())
        } else if prompt.starts_with("You are a music analyst") {
            Ok(FASTER_FOLK_TRAITS.to_string())
        } else {
            Ok(FOLK_SONGS.to_string())
        }
    })
}

#[allow(dead_code)]
pub struct Harness {
    pub engine: EngineFacade,
    pub provider: Arc<ScriptedProvider>,
    pub observer: Arc<RecordingObserver>,
    pub clock: Arc<ManualClock>,
}

/// Engine over an in-memory store and a manual clock
#[allow(dead_code)]
pub fn harness(provider: ScriptedProvider) -> Harness {
    let provider = Arc::new(provider);
    let observer = Arc::new(RecordingObserver::new());
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let mut config = Config::default();
    config.gateway.max_calls_per_window = 100;

    let engine = EngineBuilder::new(config)
        .provider(provider.clone())
        .store(Arc::new(MemoryStore::new()))
        .observer(observer.clone())
        .clock(clock.clone())
        .build()
        .expect("failed to build engine");

    Harness {
        engine,
        provider,
        observer,
        clock,
    }
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
