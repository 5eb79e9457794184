#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

// When compiling natively:
#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use clap::Parser;
    let args = parking_app_client::cli::Cli::parse();

    if let Err(e) = parking_app_client::tracing::init(&args) {
        eprintln!("Failed to start tracing: {e}");
    }

    let settings = parking_app_client::settings::load(&args)?;
    tracing::info!(?settings, "settings loaded");

    let handle = parking_app_client::background_worker::start_runtime()?;
    let _enter = handle.enter(); // This Guard must be held to call `tokio::spawn` anywhere in the program

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 720.0])
            .with_min_inner_size([480.0, 360.0])
            .with_title("Parking"),
        ..Default::default()
    };
    eframe::run_native(
        "ParkingApp",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(parking_app_client::ParkingApp::new(
                cc,
                settings,
                args.route,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("failed to run the app: {e}"))
}

// When compiling to web using trunk
#[cfg(target_arch = "wasm32")]
fn main() {
    use eframe::wasm_bindgen::JsCast as _;

    // Redirect `log` message to `console.log` and friends:
    eframe::WebLogger::init(parking_app_client::wasm_log_level()).ok();

    let web_options = eframe::WebOptions::default();

    wasm_bindgen_futures::spawn_local(async {
        let document = web_sys::window()
            .expect("No window found")
            .document()
            .expect("No document found (No DOM)");

        let canvas = document
            .get_element_by_id("the_canvas_id")
            .expect("Failed to find the_canvas_id")
            .dyn_into::<web_sys::HtmlCanvasElement>()
            .expect("the_canvas_id was not a HtmlCanvasElement");

        let settings = parking_app_client::settings::ClientSettings::for_web();
        let start_result = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(move |cc| {
                    Ok(Box::new(parking_app_client::ParkingApp::new(
                        cc,
                        settings,
                        parking_app_client::browser_path(),
                    )))
                }),
            )
            .await;

        // Remove the loading text and spinner:
        if let Some(loading_text) = document.get_element_by_id("loading_text") {
            match start_result {
                Ok(_) => {
                    loading_text.remove();
                }
                Err(e) => {
                    loading_text.set_inner_html(
                        "<p> The app has crashed. See the developer console for details. </p>",
                    );
                    panic!("Failed to start eframe: {e:?}");
                }
            }
        }
    });
}
