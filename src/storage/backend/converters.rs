use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};

use crate::storage::models::{LinkPatch, NewClick, NewLead, NewLink};
use migration::entities::{click, lead, link};

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 将 NewLink 转换为 ActiveModel（计数器从 0 开始）
pub fn new_link_to_active_model(link: &NewLink) -> link::ActiveModel {
    let now = Utc::now();
    link::ActiveModel {
        id: Set(new_id()),
        slug: Set(link.slug.clone()),
        user_id: Set(link.user_id.clone()),
        destination_number: Set(link.destination_number.clone()),
        message_template: Set(link.message_template.clone()),
        is_active: Set(link.is_active),
        ghost_mode: Set(link.ghost_mode),
        utm_source: Set(link.default_utm.source.clone()),
        utm_medium: Set(link.default_utm.medium.clone()),
        utm_campaign: Set(link.default_utm.campaign.clone()),
        utm_content: Set(link.default_utm.content.clone()),
        click_count: Set(0),
        lead_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

/// 将 LinkPatch 应用到 ActiveModel 上，计数器和归属不可修改
pub fn apply_patch(model: link::Model, patch: &LinkPatch) -> link::ActiveModel {
    let mut active: link::ActiveModel = model.into();

    if let Some(ref slug) = patch.slug {
        active.slug = Set(slug.clone());
    }
    if let Some(ref number) = patch.destination_number {
        active.destination_number = Set(number.clone());
    }
    if let Some(ref template) = patch.message_template {
        active.message_template = Set(template.clone());
    }
    if let Some(is_active) = patch.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(ghost_mode) = patch.ghost_mode {
        active.ghost_mode = Set(ghost_mode);
    }
    if let Some(ref utm) = patch.default_utm {
        active.utm_source = Set(utm.source.clone());
        active.utm_medium = Set(utm.medium.clone());
        active.utm_campaign = Set(utm.campaign.clone());
        active.utm_content = Set(utm.content.clone());
    }

    active.click_count = NotSet;
    active.lead_count = NotSet;
    active.updated_at = Set(Utc::now());
    active
}

pub fn click_to_active_model(click: &NewClick) -> click::ActiveModel {
    click::ActiveModel {
        id: Set(new_id()),
        link_id: Set(click.link_id.clone()),
        user_id: Set(click.user_id.clone()),
        clicked_at: Set(click.timestamp),
        ip_address: Set(click.ip_address.clone()),
        user_agent: Set(click.user_agent.clone()),
        referrer: Set(click.referrer.clone()),
        device: Set(click.device.as_ref().to_string()),
        utm_source: Set(click.utm.source.clone()),
        utm_medium: Set(click.utm.medium.clone()),
        utm_campaign: Set(click.utm.campaign.clone()),
        utm_content: Set(click.utm.content.clone()),
        utm_term: Set(click.utm.term.clone()),
        fbp: Set(click.fbp.clone()),
        fbc: Set(click.fbc.clone()),
        city: Set(click.city.clone()),
        country: Set(click.country.clone()),
    }
}

pub fn lead_to_active_model(lead: &NewLead) -> lead::ActiveModel {
    lead::ActiveModel {
        id: Set(new_id()),
        link_id: Set(lead.link_id.clone()),
        user_id: Set(lead.user_id.clone()),
        phone: Set(lead.phone.clone()),
        name: Set(lead.name.clone()),
        email: Set(lead.email.clone()),
        utm_source: Set(lead.utm.source.clone()),
        utm_medium: Set(lead.utm.medium.clone()),
        utm_campaign: Set(lead.utm.campaign.clone()),
        utm_content: Set(lead.utm.content.clone()),
        converted_at: Set(lead.converted_at),
    }
}
