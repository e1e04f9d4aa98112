fn main() -> std::process::ExitCode {
    icu_synth::run()
}
