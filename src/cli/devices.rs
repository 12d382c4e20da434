use simplesign::sign::{available_devices, guess_device};

/// List serial devices the sign might be attached to
pub fn execute() {
    match guess_device() {
        Some(path) => println!("Default device: {}", path.display()),
        None => println!("Default device: none found (pass -d/--device to run)"),
    }

    let ports = available_devices();
    if ports.is_empty() {
        println!("No serial ports detected");
        return;
    }

    println!();
    println!("Serial ports:");
    for port in ports {
        println!("  {}", port);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_devices_execute() {
        execute();
    }
}
