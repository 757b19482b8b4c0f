fn main() -> anyhow::Result<()> {
    tasksmith::run()
}
