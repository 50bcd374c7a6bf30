//! Generates Kotlin and Swift bindings for `bridgekit`.

fn main() {
    uniffi::uniffi_bindgen_main();
}
