use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cfg = onlykey_hid::config::Config::parse();
    onlykey_hid::run(cfg)
}
