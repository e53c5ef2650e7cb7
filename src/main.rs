fn main() -> std::process::ExitCode {
    pkgfiles_lib::run()
}
