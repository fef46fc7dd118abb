use std::cell::RefCell;
use std::rc::Rc;

use skittles_render::ForwardRenderer;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlButtonElement, HtmlCanvasElement, PointerEvent, WheelEvent, Window};

use crate::config::DemoConfig;
use crate::demo::Demo;
use crate::sound::{AudioCue, HtmlAudioCue, SilentCue};

/// Browser-side state: the demo plus the GPU resources that draw it.
pub struct App {
    demo: Demo,
    renderer: ForwardRenderer,
    canvas: HtmlCanvasElement,
    /// Renderer handle per scene geometry, indexed by `GeometryId`.
    gpu_geometry: Vec<u64>,
}

impl App {
    pub async fn new(canvas: HtmlCanvasElement, config: DemoConfig) -> Result<App, JsValue> {
        let window = web_sys::window().ok_or("No window")?;
        let (width, height) = window_size(&window)?;

        let cue: Box<dyn AudioCue> = match HtmlAudioCue::new(&config.assets.hit_sound) {
            Ok(cue) => Box::new(cue),
            Err(e) => {
                log::warn!("Hit sound unavailable, continuing silently: {e:?}");
                Box::new(SilentCue)
            }
        };

        let clear_color = config.display.clear_color;
        let mut demo = Demo::new(config, cue, width, height, window.device_pixel_ratio());
        demo.populate();

        apply_canvas_size(&canvas, &demo)?;
        let mut renderer = ForwardRenderer::new(
            wgpu::SurfaceTarget::Canvas(canvas.clone()),
            demo.viewport,
        )
        .await
        .map_err(|e| JsValue::from_str(&format!("Failed to create renderer: {e}")))?;
        renderer.set_clear_color(clear_color);

        let gpu_geometry = demo
            .scene
            .geometries
            .iter()
            .map(|kind| renderer.upload_mesh(&kind.build()))
            .collect();

        log::info!(
            "Renderer ready: {}x{} @ {}x",
            demo.viewport.css_width,
            demo.viewport.css_height,
            demo.viewport.pixel_ratio
        );

        Ok(App {
            demo,
            renderer,
            canvas,
            gpu_geometry,
        })
    }

    /// Run one frame of the loop. Called from requestAnimationFrame.
    pub fn frame(&mut self, time: f64) {
        self.demo.tick(time);

        let view = self.demo.frame_view();
        let items = self.demo.draw_items(&self.gpu_geometry);
        if let Err(e) = self.renderer.render(&view, &items) {
            log::warn!("Frame skipped: {e}");
        }
    }

    pub fn resize(&mut self, window: &Window) -> Result<(), JsValue> {
        let (width, height) = window_size(window)?;
        self.demo
            .resize(width, height, window.device_pixel_ratio());
        apply_canvas_size(&self.canvas, &self.demo)?;
        self.renderer.set_viewport(self.demo.viewport);
        Ok(())
    }
}

fn window_size(window: &Window) -> Result<(u32, u32), JsValue> {
    let width = window.inner_width()?.as_f64().unwrap_or(1.0);
    let height = window.inner_height()?.as_f64().unwrap_or(1.0);
    Ok((width.max(1.0) as u32, height.max(1.0) as u32))
}

/// Size the drawing buffer in device pixels and the element in CSS pixels.
fn apply_canvas_size(canvas: &HtmlCanvasElement, demo: &Demo) -> Result<(), JsValue> {
    let (buffer_w, buffer_h) = demo.viewport.drawing_buffer_size();
    canvas.set_width(buffer_w);
    canvas.set_height(buffer_h);
    let style = canvas.style();
    style.set_property("width", &format!("{}px", demo.viewport.css_width))?;
    style.set_property("height", &format!("{}px", demo.viewport.css_height))?;
    Ok(())
}

/// Find the canvas, build the app and start the loop.
pub async fn start_app(canvas_selector: &str, config: DemoConfig) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("No window")?;
    let document = window.document().ok_or("No document")?;
    let canvas = document
        .query_selector(canvas_selector)?
        .ok_or_else(|| JsValue::from_str(&format!("Canvas '{canvas_selector}' not found")))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| "Element is not a canvas")?;
    let play_button_id = config.assets.play_button_id.clone();

    let app = Rc::new(RefCell::new(App::new(canvas.clone(), config).await?));

    bind_resize(&window, &app)?;
    bind_pointer(&canvas, &app)?;
    match document
        .get_element_by_id(&play_button_id)
        .and_then(|el| el.dyn_into::<HtmlButtonElement>().ok())
    {
        Some(button) => bind_play_button(button, &app)?,
        None => log::warn!("Play button '#{play_button_id}' not found"),
    }
    start_loop(&window, app)
}

fn start_loop(window: &Window, app: Rc<RefCell<App>>) -> Result<(), JsValue> {
    let callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let next = Rc::clone(&callback);
    let loop_window = window.clone();

    *callback.borrow_mut() = Some(Closure::new(move |time: f64| {
        app.borrow_mut().frame(time);
        if let Some(cb) = next.borrow().as_ref() {
            if let Err(e) = loop_window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                log::warn!("requestAnimationFrame failed: {e:?}");
            }
        }
    }));

    let first = callback.borrow();
    let cb = first.as_ref().ok_or("Frame callback missing")?;
    window.request_animation_frame(cb.as_ref().unchecked_ref())?;
    Ok(())
}

fn bind_resize(window: &Window, app: &Rc<RefCell<App>>) -> Result<(), JsValue> {
    let app = Rc::clone(app);
    let resize_window = window.clone();
    let on_resize = Closure::<dyn FnMut()>::new(move || {
        if let Err(e) = app.borrow_mut().resize(&resize_window) {
            log::warn!("Resize failed: {e:?}");
        }
    });
    window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;
    on_resize.forget();
    Ok(())
}

fn bind_play_button(button: HtmlButtonElement, app: &Rc<RefCell<App>>) -> Result<(), JsValue> {
    let app = Rc::clone(app);
    let target = button.clone();
    let on_click = Closure::<dyn FnMut()>::new(move || {
        app.borrow_mut().demo.press_play();
        target.set_disabled(true);
    });
    button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();
    Ok(())
}

fn bind_pointer(canvas: &HtmlCanvasElement, app: &Rc<RefCell<App>>) -> Result<(), JsValue> {
    let down_app = Rc::clone(app);
    let on_down = Closure::<dyn FnMut(PointerEvent)>::new(move |e: PointerEvent| {
        down_app
            .borrow_mut()
            .demo
            .input
            .pointer_down(e.button(), e.offset_x() as f64, e.offset_y() as f64);
    });
    canvas.add_event_listener_with_callback("pointerdown", on_down.as_ref().unchecked_ref())?;
    on_down.forget();

    let move_app = Rc::clone(app);
    let on_move = Closure::<dyn FnMut(PointerEvent)>::new(move |e: PointerEvent| {
        move_app
            .borrow_mut()
            .demo
            .input
            .pointer_move(e.offset_x() as f64, e.offset_y() as f64);
    });
    canvas.add_event_listener_with_callback("pointermove", on_move.as_ref().unchecked_ref())?;
    on_move.forget();

    let up_app = Rc::clone(app);
    let on_up = Closure::<dyn FnMut(PointerEvent)>::new(move |e: PointerEvent| {
        up_app.borrow_mut().demo.input.pointer_up(e.button());
    });
    canvas.add_event_listener_with_callback("pointerup", on_up.as_ref().unchecked_ref())?;
    on_up.forget();

    let leave_app = Rc::clone(app);
    let on_leave = Closure::<dyn FnMut(PointerEvent)>::new(move |_e: PointerEvent| {
        leave_app.borrow_mut().demo.input.release_all();
    });
    canvas.add_event_listener_with_callback("pointerleave", on_leave.as_ref().unchecked_ref())?;
    on_leave.forget();

    let wheel_app = Rc::clone(app);
    let on_wheel = Closure::<dyn FnMut(WheelEvent)>::new(move |e: WheelEvent| {
        e.prevent_default();
        wheel_app.borrow_mut().demo.input.wheel(e.delta_y());
    });
    canvas.add_event_listener_with_callback("wheel", on_wheel.as_ref().unchecked_ref())?;
    on_wheel.forget();

    Ok(())
}
