//! Loads the startup scene, pumps its assets, and prints what landed.
//!
//! Run with `cargo run --example scene_demo`.

use stagecraft::{
    register_builtin, AppConfig, ComponentRegistry, FileAssetSource, SceneDoc, Stage,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    env_logger::Builder::new()
        .parse_filters(&config.debug.log_level)
        .init();

    let mut registry = ComponentRegistry::new();
    register_builtin(&mut registry)?;
    let mut stage = Stage::new(registry);

    let scene = SceneDoc::from_file(&config.scene.startup)?;
    let keys = scene.instantiate(&mut stage)?;
    println!("Scene '{}': {} entities", scene.name, keys.len());

    let mut source = FileAssetSource::new(&config.assets.root);
    let pumped = stage.pump_assets(&mut source);
    println!("Pumped {} asset loads", pumped);

    for key in keys {
        let entity = stage.entity(key).expect("entity was just spawned");
        println!(
            "  {} (tags: {:?}) components: {:?}, attachments: {}",
            entity.name(),
            entity.tags(),
            entity.component_names(),
            entity.attachment_count(),
        );
    }
    Ok(())
}
