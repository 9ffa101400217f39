fn main() -> anyhow::Result<()> {
    settlement_tool::run(std::env::args())
}
