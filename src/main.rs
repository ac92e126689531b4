fn main() -> anyhow::Result<()> {
    dev_event_hub_lib::run()
}
