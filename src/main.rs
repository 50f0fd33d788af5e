fn main() -> anyhow::Result<()> {
    env_logger::init();
    fluid_canvas::app::run()
}
