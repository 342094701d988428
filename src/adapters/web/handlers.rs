//! HTTP request handlers for the web adapter.
//!
//! Each handler rebuilds a `DashboardState` from the request, feeds it the
//! matching events and renders whatever state results.

use axum::{
    Form,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::adapters::session::{dispatch, dispatch_once};
use crate::domain::dashboard::{DashboardState, Event, LoadState, Mutation, Notice, Route};
use crate::domain::form::StockForm;
use crate::domain::record::RecordField;

use super::params::{DashboardParams, DashboardQuery, local_path, return_target};
use super::templates::{CreateFormContent, DashboardContent, DeleteConfirmContent};
use super::{AppState, WebError, render_page};

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, WebError> {
    let page_size = state.settings.page_size;
    let params = DashboardParams::from_query(&query, page_size);

    let mut session = DashboardState::new(page_size);
    session.dropdown.select(params.filter.value());
    session.table = params.table.clone();
    dispatch(
        &mut session,
        state.stocks.as_ref(),
        state.settings.fetch_limit,
        Event::Start,
    )
    .await;

    session.update(Event::GoToPage(params.table.page));
    if let Some(search) = &params.codes_q {
        session.update(Event::CodeSearch(search.clone()));
    }
    if let Some(id) = params.edit {
        session.update(Event::BeginEdit(id));
    }
    if let Some(notice) = query.notice.as_deref().and_then(Notice::from_key) {
        session.notices.push(notice);
    }

    let status = match session.load {
        LoadState::Failed(_) if session.records.is_empty() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::OK,
    };
    let content = DashboardContent::build(&session, &params);
    render_page(status, "Dashboard", &content, &headers)
}

pub async fn create_form(headers: HeaderMap) -> Result<Response, WebError> {
    let content = CreateFormContent::build(&StockForm::default(), &[]);
    render_page(StatusCode::OK, "Create Stock", &content, &headers)
}

pub async fn create_stock(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<StockForm>,
) -> Result<Response, WebError> {
    let mut session = DashboardState::new(state.settings.page_size);
    session.update(Event::Navigate(Route::Create));
    for field in RecordField::ALL {
        session.update(Event::FormField(field, form.value(field).to_string()));
    }
    let ran = dispatch_once(
        &mut session,
        state.stocks.as_ref(),
        state.settings.fetch_limit,
        Event::SubmitForm,
    )
    .await;

    if session.route == Route::Listing {
        let target = return_target("/", &Mutation::Create.notice_key(true));
        return Ok(Redirect::to(&target).into_response());
    }

    // nothing ran: the form was rejected before reaching the backend
    let status = if ran == 0 {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::BAD_GATEWAY
    };
    let content = CreateFormContent::build(&session.form, &session.notices);
    render_page(status, "Create Stock", &content, &headers)
}

#[derive(Debug, Deserialize)]
pub struct RecordSubmission {
    #[serde(flatten)]
    pub form: StockForm,
    #[serde(default)]
    pub return_to: String,
}

pub async fn update_stock(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Form(submission): Form<RecordSubmission>,
) -> Result<Response, WebError> {
    let record = state.stocks.get_stock(id).await?;

    let mut session = DashboardState::new(state.settings.page_size);
    session.records = vec![record];
    session.update(Event::BeginEdit(id));
    // a blank field keeps the stored value
    for field in RecordField::ALL {
        let value = submission.form.value(field).trim();
        if !value.is_empty() {
            session.update(Event::EditField(field, value.to_string()));
        }
    }
    dispatch_once(
        &mut session,
        state.stocks.as_ref(),
        state.settings.fetch_limit,
        Event::SaveEdit,
    )
    .await;

    let ok = !session.notices.iter().any(Notice::is_error);
    let target = return_target(&submission.return_to, &Mutation::Update { id }.notice_key(ok));
    Ok(Redirect::to(&target).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct ReturnTo {
    #[serde(default)]
    pub return_to: String,
}

pub async fn confirm_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Query(query): Query<ReturnTo>,
) -> Result<Response, WebError> {
    let record = state.stocks.get_stock(id).await?;
    let content = DeleteConfirmContent::build(&record, local_path(&query.return_to));
    render_page(StatusCode::OK, "Delete Stock", &content, &headers)
}

pub async fn delete_stock(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Form(form): Form<ReturnTo>,
) -> Result<Response, WebError> {
    let record = state.stocks.get_stock(id).await?;

    let mut session = DashboardState::new(state.settings.page_size);
    session.records = vec![record];
    session.update(Event::RequestDelete(id));
    dispatch_once(
        &mut session,
        state.stocks.as_ref(),
        state.settings.fetch_limit,
        Event::ConfirmDelete,
    )
    .await;

    let ok = !session.notices.iter().any(Notice::is_error);
    let target = return_target(&form.return_to, &Mutation::Delete { id }.notice_key(ok));
    Ok(Redirect::to(&target).into_response())
}

pub async fn not_found() -> WebError {
    WebError::not_found("Page not found")
}
