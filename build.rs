fn main() {
    // Tauri build (desktop shell only; the headless core needs no codegen)
    #[cfg(feature = "desktop")]
    tauri_build::build();
}
