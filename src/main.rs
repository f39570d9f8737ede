use logspace::{Environment, PropertySource};

fn main() -> logspace::Result<()> {
    // Minimal demo bootstrap against an inline environment.
    let mut source = PropertySource::new("commandLine");
    source.put("application.name", "logspace-demo");

    let mut env = Environment::new();
    env.add_first(source);

    if logspace::init(&mut env)?.is_some() {
        log::info!("rolling log configuration installed");
    }
    Ok(())
}
