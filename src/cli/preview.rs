use super::config::{resolve_config_path, SimpleSignConfig};
use chrono::Local;
use simplesign::modules::{load_module, ModuleContext};
use simplesign::queue;
use simplesign::sequence::Sequence;

/// Print the sequence a module would hand the sign right now
pub async fn execute(
    module: String,
    config_path: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = SimpleSignConfig::load_or_create(&resolve_config_path(config_path))?;
    let mut module = load_module(&module, &config.modules.dir)?;

    let now = Local::now();
    if !module.is_active(&now) {
        println!("Module '{}' is inactive right now; the sign would be blank.", module.name());
        return Ok(());
    }

    let (_handle, _sequences, mut messages) = queue::channel();
    let mut ctx = ModuleContext::at(&mut messages, now);
    let sequence = module.sign_sequence(&mut ctx).await?.unwrap_or_else(Sequence::empty);

    print!("{}", render(module.name(), &sequence));
    Ok(())
}

fn render(name: &str, sequence: &Sequence) -> String {
    let mut out = format!(
        "Module '{}': {} message(s) for {}s\n",
        name,
        sequence.messages.len(),
        sequence.duration
    );

    for (i, message) in sequence.messages.iter().enumerate() {
        let color = message.color.map(|c| c.name()).unwrap_or("-");
        let speed = message.speed.map(|s| s.name()).unwrap_or("-");
        out.push_str(&format!(
            "{:>3}. [{} {} {}] {:?}\n",
            i + 1,
            message.effective_mode(),
            color,
            speed,
            message.text
        ));
    }
    out
}
