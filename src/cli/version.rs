/// Display version information
pub fn execute() {
    println!("simplesign {}", env!("CARGO_PKG_VERSION"));
    println!("Periodically renders messages to an Alpha/BetaBrite LED sign");
}
