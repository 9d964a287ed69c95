fn main() {
    // Emit ESP-IDF link arguments when building for hardware; a plain
    // host build (tests, simulation) needs none of this.
    if std::env::var("CARGO_FEATURE_ESPIDF").is_ok() {
        embuild::espidf::sysenv::output();
    }
}
