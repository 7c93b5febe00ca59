// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::entrypoints::Entrypoint;
use crate::state::AppContext;

pub fn routes() -> Router<Arc<AppContext>> {
    Router::new().route("/.well-known/agent.json", get(agent_card))
}

async fn agent_card(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    Json(build_agent_card(&ctx))
}

fn skill_tags(entrypoint: Entrypoint) -> &'static [&'static str] {
    if entrypoint.is_analytics() {
        return &["analytics", "payments"];
    }
    match entrypoint {
        Entrypoint::Overview => &["fx", "currencies"],
        Entrypoint::Convert => &["fx", "conversion"],
        Entrypoint::Timeseries => &["fx", "rates", "statistics"],
        Entrypoint::Report => &["fx", "statistics", "volatility"],
        _ => &["fx", "rates"],
    }
}

pub fn build_agent_card(ctx: &AppContext) -> Value {
    let agent = &ctx.config.agent;

    let entrypoints: Map<String, Value> = Entrypoint::ALL
        .into_iter()
        .map(|e| {
            let entry = json!({
                "description": e.description(),
                "price": ctx.effective_price(e),
            });
            (e.key().to_string(), entry)
        })
        .collect();

    let skills: Vec<Value> = Entrypoint::ALL
        .into_iter()
        .map(|e| {
            json!({
                "id": e.key(),
                "name": e.key(),
                "description": e.description(),
                "tags": skill_tags(e),
            })
        })
        .collect();

    let payments = match &ctx.paywall {
        Some(paywall) => json!({
            "enabled": true,
            "scheme": "x402",
            "network": paywall.network(),
            "payTo": paywall.pay_to(),
            "asset": paywall.asset(),
        }),
        None => json!({ "enabled": false, "scheme": "x402" }),
    };

    json!({
        "name": agent.name,
        "description": agent.description,
        "version": agent.version,
        "url": ctx.config.public_url(),
        "capabilities": { "streaming": false, "pushNotifications": false },
        "defaultInputModes": ["application/json"],
        "defaultOutputModes": ["application/json"],
        "payments": payments,
        "entrypoints": entrypoints,
        "skills": skills,
    })
}
