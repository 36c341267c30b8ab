use crate::api::{
    AuthClient, FirebaseClient, GatewayResult, IdToken, SharedGateway, Subscription, UnauthorizedHook,
};
use crate::components::hooks::use_device_width;
use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Input, Spinner, Textarea,
};
use crate::layout::{first_note_id, select_layout, DeviceWidth, Layout};
use crate::models::{AuthSession, NoteCollection, TitleChange};
use crate::state::note_sync::{create_note, note_path};
use crate::state::{
    AppContext, AuthPhase, AuthState, NoteListState, NoteSyncController, NoteViewKind, SessionRefresher,
};
use crate::storage::{clear_session, load_session, save_session};
use crate::util::{format_last_modified, last_modified_iso, new_note_id, now_ms};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::{Route, Routes};
use leptos_router::hooks::{use_navigate, use_params};
use leptos_router::params::Params;
use leptos_router::{path, NavigateOptions};
use std::sync::Arc;

pub(crate) const FATAL_MESSAGE: &str = "Something went wrong. Please refresh the page and try again.";

/// Signs in before anything touches the store; the routed UI only mounts with a session.
#[component]
pub fn AuthGate() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let auth = app_state.0.auth;
    let auth_client = AuthClient::new(app_state.0.config.api_key.clone());

    spawn_local(async move {
        match auth_client.restore_or_sign_in(load_session()).await {
            Ok(session) => {
                log::info!("signed in as {}", session.uid);
                save_session(&session);
                auth.set(AuthState::Authenticated(session));
            }
            Err(e) => {
                log::error!("sign-in failed: {e}");
                clear_session();
                auth.set(AuthState::Failed);
                let _ = window().alert_with_message(FATAL_MESSAGE);
            }
        }
    });

    // Token refreshes replace the session but must not remount the routes.
    let phase = Memo::new(move |_| auth.with(AuthState::phase));

    move || match phase.get() {
        AuthPhase::Pending => view! {
            <div class="flex min-h-screen items-center justify-center">
                <Spinner class="size-6 text-muted-foreground" />
            </div>
        }
        .into_any(),
        AuthPhase::Ready => match auth.with_untracked(|a| a.session().cloned()) {
            Some(session) => view! { <AuthedRoutes session=session /> }.into_any(),
            None => ().into_any(),
        },
        AuthPhase::Failed => ().into_any(),
    }
}

#[component]
fn AuthedRoutes(session: AuthSession) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let id_token = IdToken::new(session.id_token);

    let refresher = SessionRefresher::new(
        app_state.0.auth,
        AuthClient::new(app_state.0.config.api_key.clone()),
        id_token.clone(),
    );
    refresher.start();
    let on_unauthorized: UnauthorizedHook = Arc::new(move |token: &str| refresher.expired(token));

    let gateway: SharedGateway = Arc::new(
        FirebaseClient::new(app_state.0.config.database_url.clone(), id_token)
            .with_unauthorized_hook(on_unauthorized),
    );
    let uid = session.uid;

    let root_view = {
        let uid = uid.clone();
        let gateway = gateway.clone();
        move || view! { <Container uid=uid.clone() gateway=gateway.clone() /> }
    };
    let note_view = move || view! { <Container uid=uid.clone() gateway=gateway.clone() /> };

    view! {
        <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
            <Route path=path!("") view=root_view />
            <Route path=path!(":note_id") view=note_view />
        </Routes>
    }
}

#[derive(Params, PartialEq, Clone, Debug)]
pub struct NoteRouteParams {
    pub note_id: Option<String>,
}

/// Chooses sidebar, editor or both from the route and the window width.
#[component]
fn Container(uid: String, gateway: SharedGateway) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let params = use_params::<NoteRouteParams>();
    let navigate = StoredValue::new(use_navigate());
    let device_width = use_device_width();

    let note_id = Memo::new(move |_| {
        params
            .get()
            .ok()
            .and_then(|p| p.note_id)
            .filter(|id| !id.trim().is_empty())
    });
    let layout = Memo::new(move |_| select_layout(device_width.get(), note_id.with(Option::is_some)));

    let list = RwSignal::new(NoteListState::new());
    let on_title_change = Callback::new(move |change: TitleChange| {
        list.update(|l| l.rename(&change));
    });

    if app_state.0.config.redirect_to_first_note {
        Effect::new(move |_| {
            if note_id.get().is_some() || device_width.get() == DeviceWidth::Small {
                return;
            }
            if let Some(first) = list.with(|l| first_note_id(l.notes())) {
                let options = NavigateOptions {
                    replace: true,
                    ..Default::default()
                };
                navigate.with_value(|nav| nav(&note_path(&first), options));
            }
        });
    }

    let container_class = move || format!("Container Container--{} flex min-h-screen", device_width.get().as_ref());

    view! {
        <div class=container_class>
            {move || {
                let uid = uid.clone();
                let gateway = gateway.clone();
                match layout.get() {
                    Layout::SidebarOnly => view! {
                        <Sidebar uid=uid gateway=gateway list=list selected=note_id />
                    }
                    .into_any(),
                    Layout::EditorOnly => view! {
                        <NotePane uid=uid gateway=gateway note_id=note_id on_title_change=None />
                    }
                    .into_any(),
                    Layout::SidebarAndEditor => view! {
                        <Sidebar uid=uid.clone() gateway=gateway.clone() list=list selected=note_id />
                        <NotePane
                            uid=uid
                            gateway=gateway
                            note_id=note_id
                            on_title_change=Some(on_title_change)
                        />
                    }
                    .into_any(),
                }
            }}
        </div>
    }
}

#[component]
fn Sidebar(
    uid: String,
    gateway: SharedGateway,
    list: RwSignal<NoteListState>,
    selected: Memo<Option<String>>,
) -> impl IntoView {
    let navigate = StoredValue::new(use_navigate());

    let on_create = {
        let uid = uid.clone();
        let gateway = gateway.clone();
        move |_| {
            let note_id = match new_note_id() {
                Ok(id) => id,
                Err(e) => {
                    log::error!("Create note failed: {e}");
                    return;
                }
            };

            let (path, done) = create_note(gateway.as_ref(), &uid, &note_id, now_ms());
            navigate.with_value(|nav| nav(&path, Default::default()));
            spawn_local(async move {
                if let Some(d) = done.await {
                    d.emit();
                }
            });
        }
    };

    view! {
        <aside data-testid="Sidebar" class="flex w-full flex-col gap-3 border-r px-3 py-4 sm:w-64 sm:shrink-0">
            <Button
                size=ButtonSize::Sm
                class="w-full"
                attr:data-testid="CreateNote__btn"
                on:click=on_create
            >
                "Create note"
            </Button>
            <NoteList uid=uid gateway=gateway list=list selected=selected />
        </aside>
    }
}

/// Live list of the user's notes.
///
/// The stream is reopened whenever the id token changes and released when the list unmounts.
#[component]
fn NoteList(
    uid: String,
    gateway: SharedGateway,
    list: RwSignal<NoteListState>,
    selected: Memo<Option<String>>,
) -> impl IntoView {
    let auth = expect_context::<AppContext>().0.auth;
    let token = Memo::new(move |_| auth.with(|a| a.session().map(|s| s.id_token.clone())));

    let subscription = StoredValue::new_local(None::<Subscription>);
    Effect::new(move |_| {
        if token.with(Option::is_none) {
            return;
        }
        subscription.set_value(None);
        let opened = gateway.subscribe_all(
            &uid,
            Box::new(move |result: GatewayResult<NoteCollection>| {
                if let Some(d) = list.try_update(|l| l.apply_push(result)).flatten() {
                    d.emit();
                }
            }),
        );
        subscription.set_value(Some(opened));
    });
    on_cleanup(move || {
        subscription.update_value(|s| {
            s.take();
        });
    });

    let error = move || list.with(|l| l.error().map(str::to_string));

    view! {
        <nav data-testid="NoteList" class="flex flex-col gap-1">
            <Show when=move || error().is_some() fallback=|| ().into_view()>
                <Alert class="border-destructive/30">
                    <AlertDescription class="text-destructive text-xs">
                        {error}
                    </AlertDescription>
                </Alert>
            </Show>

            {move || {
                if !list.with(|l| l.is_loaded()) {
                    return view! {
                        <div class="flex justify-center py-4">
                            <Spinner class="text-muted-foreground" />
                        </div>
                    }
                    .into_any();
                }

                let selected = selected.get();
                let entries = list.with(|l| l.entries(selected.as_deref()));
                if entries.is_empty() {
                    return view! {
                        <p class="px-2 py-2 text-xs text-muted-foreground">"No notes yet"</p>
                    }
                    .into_any();
                }

                entries
                    .into_iter()
                    .map(|entry| {
                        let is_selected = entry.selected;
                        let variant = if is_selected {
                            ButtonVariant::Accent
                        } else {
                            ButtonVariant::Ghost
                        };
                        view! {
                            <Button
                                variant=variant
                                size=ButtonSize::Sm
                                class="w-full justify-start truncate"
                                attr:data-testid="NoteListItem"
                                attr:aria-current=move || if is_selected { Some("page") } else { None }
                                href=note_path(&entry.id)
                            >
                                {entry.label}
                            </Button>
                        }
                    })
                    .collect::<Vec<_>>()
                    .into_any()
            }}
        </nav>
    }
}

/// Editor for the routed note.
#[component]
fn NotePane(
    uid: String,
    gateway: SharedGateway,
    note_id: Memo<Option<String>>,
    on_title_change: Option<Callback<TitleChange>>,
) -> impl IntoView {
    let navigate = StoredValue::new(use_navigate());
    let on_deleted = Callback::new(move |_: ()| {
        navigate.with_value(|nav| nav("/", Default::default()));
    });

    let sync = NoteSyncController::new(uid, gateway, on_title_change, on_deleted);
    let editor = sync.editor();
    let sync = StoredValue::new(sync);

    // Every route change starts a fresh read; older responses are dropped by the editor.
    Effect::new(move |_| {
        let id = note_id.get();
        sync.with_value(|s| s.select(id));
    });

    let kind = Memo::new(move |_| editor.with(|e| e.view().kind()));
    let title = Signal::derive(move || editor.with(|e| e.view().title().to_string()));
    let body = Signal::derive(move || editor.with(|e| e.view().body().to_string()));
    let readonly = Signal::derive(move || kind.get() != NoteViewKind::Loaded);
    let can_delete = move || editor.with(|e| e.can_delete());

    let on_title = Callback::new(move |t: String| sync.with_value(|s| s.edit_title(t)));
    let on_body = Callback::new(move |b: String| sync.with_value(|s| s.edit_body(b)));
    let on_delete = move |_| sync.with_value(|s| s.delete());

    let footer = move || {
        let ms = editor.with(|e| e.view().last_modified())?;
        let iso = last_modified_iso(ms)?;
        let label = format_last_modified(ms)?;
        Some(view! {
            <time class="text-xs text-muted-foreground" datetime=iso>
                {label}
            </time>
        })
    };

    view! {
        <main data-testid="Note" class="flex min-w-0 flex-1 flex-col gap-3 px-4 py-4">
            <Show when=move || kind.get() != NoteViewKind::Empty fallback=|| ().into_view()>
                <Show when=move || kind.get() == NoteViewKind::Loading fallback=|| ().into_view()>
                    <Spinner class="text-muted-foreground" />
                </Show>
                <Input
                    class="text-lg font-medium"
                    placeholder="Title"
                    attr:data-testid="Note__title"
                    value=title
                    readonly=readonly
                    on_input=on_title
                />
                <Textarea
                    class="flex-1"
                    attr:data-testid="Note__body"
                    value=body
                    readonly=readonly
                    on_input=on_body
                />
                <div class="flex items-center justify-between gap-2">
                    {footer}
                    <Show when=can_delete fallback=|| ().into_view()>
                        <Button
                            variant=ButtonVariant::Destructive
                            size=ButtonSize::Sm
                            attr:data-testid="Note__delete"
                            on:click=on_delete
                        >
                            "Delete"
                        </Button>
                    </Show>
                </div>
            </Show>
        </main>
    }
}
