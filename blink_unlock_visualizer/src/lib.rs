use std::sync::Arc;

use blink_unlock::config::UnlockedContent;
use blink_unlock::{CameraProvider, ControlEvent, RunSummary, Session, StatusMessage, UiSurface, VisionProvider};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};
use tokio::sync::{broadcast, mpsc, watch};

const JPEG_QUALITY: u8 = 70;

/// One JPEG-encoded debug canvas, shared by every connected socket.
#[derive(Debug, Clone)]
pub struct FramePacket {
    pub jpeg: Arc<[u8]>,
}

/// The unlocked section as the page renders it.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "web", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentPanel {
    pub heading: String,
    pub body: String,
    pub accent: String,
}

/// Everything the page shows apart from the video frames.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "web", derive(serde::Serialize, serde::Deserialize))]
pub struct PanelState {
    pub status: String,
    pub is_error: bool,
    pub unlocked: bool,
    pub content: Option<ContentPanel>,
    pub video_visible: bool,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

#[derive(Clone)]
pub struct FrameBus {
    pub frames_tx: broadcast::Sender<FramePacket>,
    /// Latest panel snapshot; late subscribers see the current state right away.
    pub panel_tx: watch::Sender<PanelState>,
}

impl FrameBus {
    pub fn new(capacity: usize) -> Self {
        let (frames_tx, _) = broadcast::channel::<FramePacket>(capacity.max(1));
        let (panel_tx, _) = watch::channel(PanelState::default());
        Self { frames_tx, panel_tx }
    }

    pub fn panel(&self) -> PanelState {
        self.panel_tx.borrow().clone()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
}

/// Routes page actions back into the session.
#[derive(Clone)]
pub struct ControlHandle {
    pub unlock_tx: mpsc::UnboundedSender<ControlEvent>,
}

/// A `UiSurface` that publishes into a `FrameBus` for the web page.
pub struct WebSurface {
    bus: FrameBus,
    panel: PanelState,
}

impl WebSurface {
    pub fn new(bus: FrameBus) -> Self {
        Self { bus, panel: PanelState::default() }
    }

    pub fn panel(&self) -> &PanelState {
        &self.panel
    }

    fn publish(&self) {
        self.bus.panel_tx.send_replace(self.panel.clone());
    }
}

impl UiSurface for WebSurface {
    fn set_status(&mut self, status: &StatusMessage) {
        self.panel.status = status.to_string();
        self.panel.is_error = status.is_error();
        self.publish();
    }

    fn reveal_content(&mut self, content: &UnlockedContent) {
        self.panel.unlocked = true;
        self.panel.content = Some(ContentPanel {
            heading: content.heading.clone(),
            body: content.body.clone(),
            accent: content.accent.clone(),
        });
        self.publish();
    }

    fn show_video(&mut self) {
        self.panel.video_visible = true;
        self.publish();
    }

    fn resize_canvas(&mut self, width: u32, height: u32) {
        self.panel.canvas_width = width;
        self.panel.canvas_height = height;
        self.publish();
    }

    fn present_frame(&mut self, canvas: &RgbaImage) {
        // Nobody is watching, skip the encode.
        if self.bus.frames_tx.receiver_count() == 0 {
            return;
        }
        match encode_jpeg(canvas) {
            Ok(data) => {
                let _ = self.bus.frames_tx.send(FramePacket { jpeg: data.into() });
            }
            Err(err) => tracing::warn!(error = %err, "debug frame encode failed"),
        }
    }
}

/// Boots `session` and serves it until frames and control events are both done.
/// A failed boot still serves control events, so the page's button keeps working.
pub async fn serve_session<V, C, U>(
    session: &mut Session<V, C, U>,
    control: &mut mpsc::UnboundedReceiver<ControlEvent>,
) -> RunSummary
where
    V: VisionProvider,
    C: CameraProvider,
    U: UiSurface,
{
    if let Err(err) = session.boot().await {
        tracing::error!(error = %err, "automatic gesture detection unavailable");
    }
    session.run(control).await
}

pub fn encode_jpeg(canvas: &RgbaImage) -> image::ImageResult<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(canvas.clone()).to_rgb8();
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY).write_image(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(buffer)
}

#[cfg(feature = "web")]
pub async fn start_server(bus: FrameBus, cfg: ServerConfig, control: ControlHandle) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
    use axum::http::{header, HeaderValue, StatusCode};
    use axum::response::{Html, IntoResponse};
    use axum::routing::{get, post};
    use axum::Router;
    use leptos::*;

    #[component]
    fn App(status: String) -> impl IntoView {
        view! {
            <main>
                <h2>Wink to unlock the guide</h2>
                <div style="margin: 8px 0; display:flex; gap:12px; align-items:center;">
                    <button id="unlock-manual" style="padding:6px 12px;">Unlock manually</button>
                    <span id="status" style="font-family:monospace; font-size:12px; color:#777">{status}</span>
                </div>
                <canvas id="canvas-output" width="640" height="480" style="display:none; border:1px solid #444"></canvas>
                <section id="chatbot" style="margin-top:12px; padding:12px; border:1px solid #ccc;">
                    <div id="chatbot-status"><h2>Guide locked</h2><p>Wink at the camera to reveal the guide.</p></div>
                </section>
                <script src="/client.js"></script>
            </main>
        }
    }

    const CLIENT_JS: &str = r#"(function(){
        const status = document.getElementById('status');
        const canvas = document.getElementById('canvas-output');
        const ctx = canvas.getContext('2d');
        const section = document.getElementById('chatbot');
        const sectionBody = document.getElementById('chatbot-status');
        const button = document.getElementById('unlock-manual');
        if(button){ button.onclick = ()=> fetch('/control/unlock', { method:'POST' }); }
        const applyPanel = (p)=>{
            status.textContent = p.status;
            status.style.color = p.is_error ? '#c00' : '#777';
            if(p.video_visible){ canvas.style.display = 'block'; }
            if(p.canvas_width && p.canvas_height && (canvas.width !== p.canvas_width || canvas.height !== p.canvas_height)){
                canvas.width = p.canvas_width; canvas.height = p.canvas_height;
            }
            if(p.unlocked && p.content){
                section.style.backgroundColor = p.content.accent;
                sectionBody.replaceChildren();
                const h = document.createElement('h2'); h.textContent = p.content.heading;
                const b = document.createElement('p'); b.textContent = p.content.body;
                sectionBody.append(h, b);
                if(button){ button.disabled = true; }
            }
        };
        const ws = new WebSocket((location.protocol==='https:'?'wss://':'ws://')+location.host+'/ws/stream');
        ws.binaryType = 'arraybuffer';
        ws.onclose = ()=>{ status.textContent = 'disconnected'; };
        ws.onmessage = async (ev)=>{
            if(typeof ev.data === 'string'){ applyPanel(JSON.parse(ev.data)); return; }
            const bmp = await createImageBitmap(new Blob([ev.data], {type:'image/jpeg'}));
            ctx.drawImage(bmp, 0, 0, canvas.width, canvas.height);
        };
    })();"#;

    fn render_page(status: String) -> String {
        let body = leptos::ssr::render_to_string(move || view! { <App status=status/> });
        format!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Blink Unlock</title></head><body>{}</body></html>",
            &*body
        )
    }

    async fn send_panel(socket: &mut WebSocket, panel: &PanelState) -> Result<(), ()> {
        let text = serde_json::to_string(panel).map_err(|_| ())?;
        socket.send(Message::Text(text)).await.map_err(|_| ())
    }

    async fn stream_conn(mut socket: WebSocket, bus: FrameBus) {
        let mut panel_rx = bus.panel_tx.subscribe();
        let mut frames_rx = bus.frames_tx.subscribe();

        let initial = panel_rx.borrow_and_update().clone();
        if send_panel(&mut socket, &initial).await.is_err() {
            return;
        }
        loop {
            tokio::select! {
                changed = panel_rx.changed() => {
                    if changed.is_err() { break; }
                    let panel = panel_rx.borrow_and_update().clone();
                    if send_panel(&mut socket, &panel).await.is_err() { break; }
                }
                frame = frames_rx.recv() => match frame {
                    Ok(pkt) => {
                        if socket.send(Message::Binary(pkt.jpeg.to_vec())).await.is_err() { break; }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(_) => break,
                },
                incoming = socket.recv() => match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                },
            }
        }
    }

    let bus_page = bus.clone();
    let bus_ws = bus.clone();
    let unlock_tx = control.unlock_tx.clone();

    let app = Router::new()
        .route("/", get(move || {
            let status = bus_page.panel().status;
            async move { Html(render_page(status)) }
        }))
        .route("/healthz", get(|| async { "ok" }))
        .route("/client.js", get(|| async {
            let mut resp = axum::response::Response::new(axum::body::Body::from(CLIENT_JS));
            resp.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static("application/javascript"));
            resp
        }))
        .route("/ws/stream", get(move |ws: WebSocketUpgrade| {
            let bus = bus_ws.clone();
            async move { ws.on_upgrade(move |socket| stream_conn(socket, bus)) }
        }))
        .route("/control/unlock", post(move || {
            let tx = unlock_tx.clone();
            async move {
                let code = match tx.send(ControlEvent::ManualUnlock) {
                    Ok(()) => StatusCode::NO_CONTENT,
                    Err(_) => StatusCode::SERVICE_UNAVAILABLE,
                };
                code.into_response()
            }
        }));

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!(addr = %cfg.bind_addr, "visualizer server listening");
    let server = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            tracing::error!(error = %err, "visualizer server stopped");
        }
    });

    Ok(server)
}

#[cfg(not(feature = "web"))]
pub async fn start_server(_bus: FrameBus, _cfg: ServerConfig, _control: ControlHandle) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    Err(anyhow::anyhow!("web feature not enabled for blink_unlock_visualizer"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn web_surface_publishes_panel_snapshots() {
        let bus = FrameBus::new(2);
        let mut surface = WebSurface::new(bus.clone());

        surface.set_status(&StatusMessage::CameraError { message: "denied".into() });
        assert!(bus.panel().is_error);
        assert_eq!(bus.panel().status, "Error starting camera: denied.");

        surface.show_video();
        surface.resize_canvas(320, 240);
        surface.reveal_content(&UnlockedContent::default());
        let panel = bus.panel();
        assert!(panel.video_visible);
        assert_eq!((panel.canvas_width, panel.canvas_height), (320, 240));
        assert!(panel.unlocked);
        assert_eq!(panel.content.unwrap().accent, "#d4edda");
    }

    #[test]
    fn frames_are_encoded_only_when_subscribed() {
        let bus = FrameBus::new(2);
        let mut surface = WebSurface::new(bus.clone());
        let canvas = RgbaImage::from_pixel(16, 12, Rgba([200, 10, 10, 255]));

        surface.present_frame(&canvas);

        let mut rx = bus.frames_tx.subscribe();
        assert!(rx.try_recv().is_err());
        surface.present_frame(&canvas);
        let packet = rx.try_recv().unwrap();
        assert_eq!(&packet.jpeg[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&packet.jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 12));
    }

    #[tokio::test]
    async fn page_button_works_after_a_failed_boot() {
        use blink_unlock::synthetic::{ScriptedCamera, ScriptedVision};
        use blink_unlock::{CameraError, UnlockConfig};

        let bus = FrameBus::new(2);
        let camera = ScriptedCamera::failing(CameraError::Unavailable("no device".into()));
        let mut session =
            Session::new(UnlockConfig::default(), ScriptedVision::new(), camera, WebSurface::new(bus.clone())).unwrap();

        let (unlock_tx, mut unlock_rx) = mpsc::unbounded_channel();
        unlock_tx.send(ControlEvent::ManualUnlock).unwrap();
        drop(unlock_tx);
        let summary = serve_session(&mut session, &mut unlock_rx).await;

        assert_eq!(summary.control_events, 1);
        let panel = bus.panel();
        assert!(panel.unlocked);
        assert!(!panel.video_visible);
        assert_eq!(panel.content.unwrap().accent, "#d4edda");
    }

    #[tokio::test]
    async fn start_server_requires_web_feature() {
        if cfg!(feature = "web") {
            return;
        }
        let (unlock_tx, _rx) = mpsc::unbounded_channel();
        let result = start_server(
            FrameBus::new(1),
            ServerConfig { bind_addr: "127.0.0.1:0".into() },
            ControlHandle { unlock_tx },
        )
        .await;
        assert!(result.is_err());
    }
}
