use gloo_timers::future::TimeoutFuture;
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlTextAreaElement, KeyboardEvent, MouseEvent};

use crate::config::ComposerConfig;
use crate::dom::TextAreaBuffer;
use crate::editor_core::prefill;
use crate::format::{apply_format_command, FormatCommand};
use crate::http;
use crate::lookup::LookupRequest;
use crate::mention::CloseReason;
use crate::mention_list::{InputKind, Key, KeyOutcome, MentionListController};
use crate::upload::append_media_link;

pub const PREFILL_EVENT: &str = "composer-prefill";

/// Detail of a `composer-prefill` event fired by reply/edit links.
#[derive(Deserialize, Clone, Debug)]
struct PrefillRequest {
    text: String,
    #[serde(default)]
    hash: Option<String>,
}

fn with_buffer<R>(
    textarea: NodeRef<html::Textarea>,
    f: impl FnOnce(&mut TextAreaBuffer) -> R,
) -> Option<R> {
    let element: HtmlTextAreaElement = textarea.get_untracked()?;
    Some(f(&mut TextAreaBuffer::new(element)))
}

/// Waits out the debounce window, then fetches only if `request` is still the
/// latest one. The response is handed back to the controller, which drops it
/// if something newer was issued in the meantime.
fn dispatch_lookup(
    controller: RwSignal<MentionListController>,
    config: StoredValue<ComposerConfig>,
    request: LookupRequest,
) {
    let (url, debounce_ms) = config.with_value(|c| (c.lookup_url.clone(), c.debounce_ms));
    spawn_local(async move {
        TimeoutFuture::new(debounce_ms).await;
        if !controller.with_untracked(|c| c.is_current(request.ticket)) {
            return;
        }
        let result = http::fetch_candidates(&url, request.prefix.as_deref()).await;
        controller.update(|c| {
            c.apply_lookup(request.ticket, result);
        });
    });
}

#[component]
pub fn Composer(config: ComposerConfig) -> impl IntoView {
    let controller = RwSignal::new(MentionListController::new(config.trigger));
    let config = StoredValue::new(config);
    let (posting, set_posting) = signal(false);
    let (uploading, set_uploading) = signal(false);

    let textarea: NodeRef<html::Textarea> = NodeRef::new();
    let post_form: NodeRef<html::Form> = NodeRef::new();
    let upload_form: NodeRef<html::Form> = NodeRef::new();
    let hash_input: NodeRef<html::Input> = NodeRef::new();

    let refresh_selection = move || {
        let request = with_buffer(textarea, |buffer| {
            controller
                .try_update(|c| c.on_selection_change(&*buffer))
                .flatten()
        })
        .flatten();
        if let Some(request) = request {
            dispatch_lookup(controller, config, request);
        }
    };

    let closure = Closure::<dyn FnMut(leptos::web_sys::CustomEvent)>::new(
        move |e: leptos::web_sys::CustomEvent| {
            let request = match serde_wasm_bindgen::from_value::<PrefillRequest>(e.detail()) {
                Ok(request) => request,
                Err(err) => {
                    tracing::warn!(%err, "ignoring malformed prefill event");
                    return;
                }
            };
            controller.update(|c| c.close(CloseReason::Replaced));
            if let Some(Err(err)) = with_buffer(textarea, |buffer| prefill(buffer, &request.text)) {
                tracing::warn!(%err, "prefill failed");
            }
            if let Some(input) = hash_input.get_untracked() {
                input.set_value(request.hash.as_deref().unwrap_or_default());
            }
        },
    );
    let _ = window().add_event_listener_with_callback(PREFILL_EVENT, closure.as_ref().unchecked_ref());
    closure.forget();

    let on_input = move |ev: leptos::web_sys::Event| {
        let kind = ev
            .dyn_ref::<leptos::web_sys::InputEvent>()
            .map(|e| InputKind::from_input_type(&e.input_type()))
            .unwrap_or(InputKind::Other);
        let request = with_buffer(textarea, |buffer| {
            controller.try_update(|c| c.on_input(&*buffer, kind)).flatten()
        })
        .flatten();
        if let Some(request) = request {
            dispatch_lookup(controller, config, request);
        }
    };

    let on_keydown = move |ev: KeyboardEvent| {
        if !controller.with_untracked(|c| c.is_open()) {
            return;
        }
        let key = Key::from_key_name(&ev.key());
        let outcome = with_buffer(textarea, |buffer| {
            controller.try_update(|c| c.on_key(key, buffer))
        })
        .flatten();
        if outcome == Some(KeyOutcome::Handled) {
            ev.prevent_default();
        }
    };

    // Caret moves that don't fire `input` (arrows, Home/End) can still end a session.
    let on_keyup = move |_: KeyboardEvent| refresh_selection();

    let run_format = move |command: FormatCommand| {
        if let Some(Err(err)) = with_buffer(textarea, |buffer| apply_format_command(buffer, command)) {
            tracing::warn!(%err, label = command.label(), "format command failed");
        }
        refresh_selection();
    };

    let toggle_mention = move || {
        let result = with_buffer(textarea, |buffer| {
            controller.try_update(|c| c.toggle_from_button(buffer))
        })
        .flatten();
        match result {
            Some(Ok(Some(request))) => dispatch_lookup(controller, config, request),
            Some(Err(err)) => tracing::warn!(%err, "could not insert mention trigger"),
            _ => {}
        }
    };

    let commit_candidate = move |index: usize| {
        let result = with_buffer(textarea, |buffer| {
            controller.try_update(|c| c.commit(index, buffer))
        })
        .flatten();
        if let Some(Err(err)) = result {
            tracing::warn!(%err, "mention commit rejected");
            controller.update(|c| c.close(CloseReason::AnchorOutOfRange));
        }
    };

    let on_upload = move |_: leptos::web_sys::Event| {
        let Some(form) = upload_form.get_untracked() else {
            return;
        };
        let url = config.with_value(|c| c.upload_url.clone());
        set_uploading.set(true);
        spawn_local(async move {
            match http::upload_media(&url, &form).await {
                Ok(response) => {
                    if let Some(Err(err)) =
                        with_buffer(textarea, |buffer| append_media_link(buffer, &response.path))
                    {
                        tracing::warn!(%err, "could not insert media link");
                    }
                    refresh_selection();
                }
                Err(err) => {
                    tracing::error!(%err, "media upload failed");
                    let _ = window().alert_with_message(&format!(
                        "An error occurred uploading your media: {err}"
                    ));
                }
            }
            form.reset();
            set_uploading.set(false);
        });
    };

    let submit_post = move |ev: MouseEvent| {
        ev.prevent_default();
        if posting.get_untracked() {
            return;
        }
        let Some(form) = post_form.get_untracked() else {
            return;
        };
        set_posting.set(true);
        if let Err(err) = form.submit() {
            tracing::error!(error = ?err, "post submission failed");
            set_posting.set(false);
        }
    };

    let tool_button = move |title: &'static str, icon: &'static str, command: FormatCommand| {
        view! {
            <button
                type="button"
                class="composer-tool"
                title=title
                on:mousedown=|ev: MouseEvent| ev.prevent_default()
                on:click=move |_| run_format(command)
            >
                {icon}
            </button>
        }
    };

    let mention_list = move || {
        let popup = controller.with(|c| c.popup());
        if !popup.open {
            return None;
        }
        let highlighted = popup.highlighted;
        let top = textarea
            .get()
            .map(|el| el.client_height() + 2)
            .unwrap_or_default();
        let items = popup
            .candidates
            .into_iter()
            .enumerate()
            .map(|(index, candidate)| {
                let class = if highlighted == Some(index) {
                    "user-list__user active"
                } else {
                    "user-list__user"
                };
                let avatar = format!("background-image: url('{}')", candidate.avatar_url());
                view! {
                    <div
                        class=class
                        on:mousedown=move |ev: MouseEvent| {
                            ev.prevent_default();
                            commit_candidate(index);
                        }
                        on:mouseenter=move |_| controller.update(|c| c.highlight(index))
                    >
                        <div class="avatar" style=avatar></div>
                        <div class="info">
                            <div class="nickname">{candidate.display_text}</div>
                        </div>
                    </div>
                }
            })
            .collect::<Vec<_>>();
        Some(view! {
            <div id="mentioned-list" class="mentioned-list show" style=format!("top: {top}px;")>
                <div class="mentioned-list-content">{items}</div>
                {popup.error.map(|error| view! { <div class="mentioned-list-error">{error}</div> })}
            </div>
        })
    };

    let (post_url, upload_url) = config.with_value(|c| (c.post_url.clone(), c.upload_url.clone()));

    view! {
        <div class="composer">
            <form id="twtForm" node_ref=post_form action=post_url method="post">
                <div class="composer-toolbar">
                    {tool_button("Bold", "B", FormatCommand::BOLD)}
                    {tool_button("Italic", "I", FormatCommand::ITALIC)}
                    {tool_button("Strikethrough", "S", FormatCommand::STRIKE)}
                    {tool_button("Code", "</>", FormatCommand::CODE)}
                    {tool_button("Link", "🔗", FormatCommand::LINK)}
                    {tool_button("Image", "🖼", FormatCommand::IMAGE)}
                    <button
                        type="button"
                        class="composer-tool"
                        title="Mention"
                        on:mousedown=|ev: MouseEvent| ev.prevent_default()
                        on:click=move |_| toggle_mention()
                    >
                        "@"
                    </button>
                </div>
                <div class="composer-field" style="position: relative;">
                    <textarea
                        id="text"
                        name="text"
                        node_ref=textarea
                        placeholder="What's on your mind?"
                        on:input=on_input
                        on:keydown=on_keydown
                        on:keyup=on_keyup
                        on:click=move |_| refresh_selection()
                        on:blur=move |_| controller.update(|c| c.on_blur())
                    ></textarea>
                    {mention_list}
                </div>
                <input type="hidden" name="hash" id="replaceTwt" node_ref=hash_input />
                <button
                    id="post"
                    type="submit"
                    disabled=move || posting.get()
                    on:click=submit_post
                >
                    {move || if posting.get() { "Posting..." } else { "Post" }}
                </button>
            </form>
            <form
                id="uploadForm"
                node_ref=upload_form
                action=upload_url
                method="post"
                enctype="multipart/form-data"
            >
                <label class={move || if uploading.get() { "upload uploading" } else { "upload" }}>
                    {move || if uploading.get() { "Uploading..." } else { "Attach media" }}
                    <input
                        id="uploadMedia"
                        type="file"
                        name="media_file"
                        accept="image/*,audio/*,video/*"
                        disabled=move || uploading.get()
                        on:change=on_upload
                    />
                </label>
            </form>
        </div>
    }
}
