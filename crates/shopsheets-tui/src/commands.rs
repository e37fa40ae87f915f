//! Non-interactive subcommands. Each prints its result to stdout.

use std::path::Path;

use anyhow::{bail, Context as _, Result};
use serde::de::DeserializeOwned;
use shopsheets_core::api::ApiError;
use shopsheets_core::dashboard::{count_label, search_workers, PaymentFilter, PaymentSummary};
use shopsheets_core::forms::{
    CombinedCustomerDraft, Draft, FabricExpenseDraft, FabricOrderDraft, OtherExpenseDraft,
    PaymentDraft, TailorOrderDraft, WorkerDraft,
};
use shopsheets_core::models::PaymentStatus;
use shopsheets_core::saga::{CombinedOrderSaga, SubOrderLink};
use shopsheets_core::store::{ApiKeyStore, SessionStore};
use shopsheets_core::utils::{format_date, format_inr, format_phone};
use tracing::info;

use crate::cli::{CacheCommand, CombinedCommand, FormKind, WorkersCommand};
use crate::context::Context;

// ===== Setup =====

pub async fn setup(ctx: &Context, key: Option<String>, forget: bool) -> Result<()> {
    if forget {
        ApiKeyStore::delete()?;
        println!("API key removed.");
        return Ok(());
    }

    let key = match key {
        Some(k) => k,
        None => rpassword::prompt_password("Google Sheets API key: ")?,
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("Please enter an API key");
    }

    println!("Testing connection...");
    ctx.sheets(key)
        .test_connection(key, &ctx.config.spreadsheets.workers)
        .await
        .map_err(|e| anyhow::anyhow!("Connection failed: {}", e))?;

    ApiKeyStore::store(key)?;
    println!("Connection successful! API key saved.");

    // Write the effective config so endpoints and sheet ids can be edited
    ctx.config.save()?;
    Ok(())
}

// ===== Forms =====

/// The draft from `file`, or the autosaved one when no file is given.
fn load_draft<D: Draft>(store: &mut SessionStore, file: Option<&Path>) -> Result<D> {
    match file {
        Some(path) => read_json(path),
        None => match D::restore(store) {
            Some(snapshot) => {
                println!("Resuming draft saved {}", snapshot.timestamp.format("%d %b %H:%M"));
                Ok(snapshot.data)
            }
            None => bail!("No draft file given and no saved draft for this form"),
        },
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid draft in {}", path.display()))
}

/// Validate, autosaving the draft when it is rejected so it can be resumed.
fn validate_or_keep<D: Draft>(draft: &D, store: &mut SessionStore) -> Result<D::Output> {
    match draft.validate() {
        Ok(output) => Ok(output),
        Err(e) => {
            draft.autosave(store)?;
            bail!("{} (draft saved)", e.message)
        }
    }
}

/// Submit and clear the autosave; on failure the draft is kept.
async fn submit_form<D, F, Fut>(store: &mut SessionStore, file: Option<&Path>, send: F) -> Result<String>
where
    D: Draft,
    F: FnOnce(D::Output) -> Fut,
    Fut: std::future::Future<Output = Result<String, ApiError>>,
{
    let draft: D = load_draft(store, file)?;
    let output = validate_or_keep(&draft, store)?;
    match send(output).await {
        Ok(message) => {
            D::clear_autosave(store)?;
            Ok(message)
        }
        Err(e) => {
            draft.autosave(store)?;
            if e.is_transport() {
                bail!("{} (draft saved, submit again when back online)", e)
            }
            Err(e.into())
        }
    }
}

pub async fn submit(ctx: &Context, form: FormKind, file: Option<&Path>) -> Result<()> {
    let mut store = ctx.session()?;
    let scripts = &ctx.scripts;

    let message = match form {
        FormKind::Worker => {
            submit_form::<WorkerDraft, _, _>(&mut store, file, |worker| async move {
                let reply = scripts.workers.add_worker(&worker).await?;
                Ok(reply.message.unwrap_or_else(|| format!("Worker {} added", worker.name)))
            })
            .await?
        }
        FormKind::Payment => {
            submit_form::<PaymentDraft, _, _>(&mut store, file, |entry| async move {
                let amounts = entry.amounts();
                scripts.workers.add_payment(&entry).await?;
                Ok(format!(
                    "Payment saved for {}: work {}, remaining {}",
                    entry.worker_name,
                    format_inr(amounts.total_amount),
                    format_inr(amounts.remaining_amount)
                ))
            })
            .await?
        }
        FormKind::Fabric => {
            submit_form::<FabricOrderDraft, _, _>(&mut store, file, |order| async move {
                scripts.fabric_orders.submit_fabric_order(&order).await?;
                Ok(format!(
                    "Fabric order {} saved ({})",
                    order.order_id,
                    format_inr(order.total())
                ))
            })
            .await?
        }
        FormKind::Tailor => {
            submit_form::<TailorOrderDraft, _, _>(&mut store, file, |order| async move {
                let outcome = scripts.tailor_orders.submit_tailor_order(&order).await?;
                Ok(format!("Tailoring order {}: {}", order.order_id, outcome.message()))
            })
            .await?
        }
        FormKind::FabricExpense => {
            submit_form::<FabricExpenseDraft, _, _>(&mut store, file, |expense| async move {
                let outcome = scripts.expenses.submit_fabric_expense(&expense).await?;
                Ok(format!(
                    "Fabric expense {} {}: {}",
                    expense.supplier,
                    format_inr(expense.total_price),
                    outcome.message()
                ))
            })
            .await?
        }
        FormKind::OtherExpense => {
            submit_form::<OtherExpenseDraft, _, _>(&mut store, file, |expense| async move {
                let outcome = scripts.expenses.submit_other_expense(&expense).await?;
                Ok(format!(
                    "Expense {} {}: {}",
                    expense.expense_name,
                    format_inr(expense.amount),
                    outcome.message()
                ))
            })
            .await?
        }
    };

    println!("{}", message);
    Ok(())
}

// ===== Combined order =====

fn resume_saga(store: SessionStore) -> Result<CombinedOrderSaga> {
    CombinedOrderSaga::resume(store)
        .map_err(|_| anyhow::anyhow!("No combined order in progress. Run `shop combined start` first."))
}

fn fill_blank(field: &mut String, linked: &str) {
    if field.trim().is_empty() {
        *field = linked.to_string();
    }
}

/// Linked id always wins; customer fields left blank in the file come from
/// the combined order.
fn linked_fabric(mut draft: FabricOrderDraft, link: &SubOrderLink) -> FabricOrderDraft {
    let linked = FabricOrderDraft::for_link(link);
    draft.order_id = linked.order_id;
    fill_blank(&mut draft.customer_name, &linked.customer_name);
    fill_blank(&mut draft.contact_number, &linked.contact_number);
    fill_blank(&mut draft.address, &linked.address);
    fill_blank(&mut draft.customer_type, &linked.customer_type);
    fill_blank(&mut draft.purchase_date, &linked.purchase_date);
    fill_blank(&mut draft.session, &linked.session);
    fill_blank(&mut draft.note, &linked.note);
    draft
}

fn linked_tailor(mut draft: TailorOrderDraft, link: &SubOrderLink) -> TailorOrderDraft {
    let linked = TailorOrderDraft::for_link(link);
    draft.order_id = linked.order_id;
    fill_blank(&mut draft.customer_name, &linked.customer_name);
    fill_blank(&mut draft.contact_info, &linked.contact_info);
    fill_blank(&mut draft.address, &linked.address);
    fill_blank(&mut draft.customer_type, &linked.customer_type);
    fill_blank(&mut draft.order_date, &linked.order_date);
    fill_blank(&mut draft.season, &linked.season);
    fill_blank(&mut draft.notes, &linked.notes);
    draft
}

/// Settle a sub-order submission. A failed one backs the combined order out
/// of its pending state and keeps the draft for the next attempt.
fn sub_order_sent<D: Draft, T>(
    saga: &mut CombinedOrderSaga,
    draft: &D,
    sent: Result<T, ApiError>,
) -> Result<T> {
    match sent {
        Ok(value) => {
            D::clear_autosave(saga.store_mut())?;
            Ok(value)
        }
        Err(e) => {
            saga.cancel_pending()?;
            draft.autosave(saga.store_mut())?;
            bail!("{} (draft saved, the combined order is {})", e, saga.state())
        }
    }
}

pub async fn combined(ctx: &Context, command: CombinedCommand) -> Result<()> {
    let store = ctx.session()?;

    match command {
        CombinedCommand::Start { file } => {
            let customer: CombinedCustomerDraft = read_json(&file)?;
            let saga = CombinedOrderSaga::start(store, &customer)?;
            println!(
                "Combined order {} started for {}",
                saga.data().master_order_id,
                saga.data().customer.customer_name
            );
        }
        CombinedCommand::Fabric { file } => {
            let mut saga = resume_saga(store)?;
            let link = saga.fabric_link()?;
            let draft = linked_fabric(load_draft(saga.store_mut(), file.as_deref())?, &link);
            println!("Running total: {}", format_inr(draft.order_total()));
            let order = validate_or_keep(&draft, saga.store_mut())?;
            saga.begin_fabric()?;
            let sent = ctx.scripts.fabric_orders.submit_fabric_order(&order).await;
            sub_order_sent(&mut saga, &draft, sent)?;
            saga.complete_fabric(order.total(), Some(order.order_id.clone()))?;
            println!("Fabric order {} linked ({})", order.order_id, format_inr(order.total()));
            print_next_step(&saga);
        }
        CombinedCommand::Tailor { file } => {
            let mut saga = resume_saga(store)?;
            let link = saga.tailor_link()?;
            let draft = linked_tailor(load_draft(saga.store_mut(), file.as_deref())?, &link);
            let order = validate_or_keep(&draft, saga.store_mut())?;
            saga.begin_tailor()?;
            let sent = ctx.scripts.tailor_orders.submit_tailor_order(&order).await;
            let outcome = sub_order_sent(&mut saga, &draft, sent)?;
            saga.complete_tailor(Some(order.price), Some(order.order_id.clone()))?;
            println!("Tailoring order {} linked: {}", order.order_id, outcome.message());
            print_next_step(&saga);
        }
        CombinedCommand::Status => match CombinedOrderSaga::resume(store) {
            Ok(saga) => print_status(&saga),
            Err(_) => println!("No combined order in progress."),
        },
        CombinedCommand::Save { paid } => save_combined(ctx, resume_saga(store)?, paid).await?,
        CombinedCommand::Abandon => {
            let (orphans, _) = resume_saga(store)?.abandon()?;
            println!("Combined order abandoned.");
            for orphan in orphans {
                println!(
                    "  {} ({}) is still in its sheet without a combined row",
                    orphan.order_id,
                    format_inr(orphan.price)
                );
            }
        }
    }
    Ok(())
}

async fn save_combined(ctx: &Context, mut saga: CombinedOrderSaga, paid: PaymentStatus) -> Result<()> {
    let payload = saga.payload(paid)?;
    let outcome = ctx.scripts.combined_orders.submit_combined_order(&payload).await?;
    let combined_id = saga.mark_saved(&outcome)?;
    info!(%combined_id, "Combined order saved from CLI");
    println!("{}", outcome.message());
    println!(
        "Combined order {} saved: {} + {} = {}",
        combined_id,
        format_inr(payload.fabric_price),
        format_inr(payload.tailoring_price),
        format_inr(payload.total_amount)
    );
    Ok(())
}

fn print_status(saga: &CombinedOrderSaga) {
    let data = saga.data();
    println!("Master order: {}", data.master_order_id);
    println!("Customer:     {} ({})", data.customer.customer_name, data.customer.contact);
    println!("State:        {}", saga.state());
    let line = |label: &str, sub: &Option<shopsheets_core::saga::SubOrder>| match sub {
        Some(s) => println!("{:<13} {} {}", label, s.order_id, format_inr(s.price)),
        None => println!("{:<13} not added", label),
    };
    line("Fabric:", &data.fabric);
    line("Tailoring:", &data.tailoring);
    println!("Subtotal:     {}", format_inr(saga.subtotal()));
}

fn print_next_step(saga: &CombinedOrderSaga) {
    if saga.fabric_price() <= 0.0 {
        println!("Next: shop combined fabric [file]");
    } else if saga.tailoring_price() <= 0.0 {
        println!("Next: shop combined tailor [file]");
    } else {
        println!("Next: shop combined save --paid <paid|unpaid|partial>");
    }
}

// ===== Workers and payments =====

pub async fn workers(ctx: &Context, command: WorkersCommand) -> Result<()> {
    match command {
        WorkersCommand::List { search } => {
            let workers = ctx.scripts.workers.get_workers().await?;
            let shown = search_workers(&workers, search.as_deref().unwrap_or(""));
            for worker in &shown {
                println!(
                    "{:<24} {:<16} {:<30} {}",
                    worker.name,
                    format_phone(&worker.phone),
                    worker.address,
                    format_date(&worker.date_added)
                );
            }
            println!("{}", count_label(shown.len(), workers.len(), "worker"));
        }
        WorkersCommand::Names => {
            for name in ctx.scripts.workers.get_worker_names().await? {
                println!("{}", name);
            }
        }
    }
    Ok(())
}

pub async fn payments(ctx: &Context, filter: PaymentFilter) -> Result<()> {
    let records = ctx.scripts.workers.get_payment_history().await?;
    let shown = filter.apply(&records);
    for record in &shown {
        println!(
            "{:<12} {:<20} {:>12} {:>12} {:>12}  {}",
            format_date(&record.date),
            record.worker_name,
            format_inr(record.total_work_amount),
            format_inr(record.advance_taken),
            format_inr(record.remaining_payment),
            record.notes
        );
    }
    let summary = PaymentSummary::of(shown.iter().copied());
    println!();
    println!("Total work:      {}", format_inr(summary.total_work));
    println!("Total advance:   {}", format_inr(summary.total_advance));
    println!("Total remaining: {}", format_inr(summary.total_remaining));
    println!("{}", count_label(summary.entries, records.len(), "payment record"));
    Ok(())
}

// ===== Cache =====

pub async fn cache(ctx: &Context, command: CacheCommand) -> Result<()> {
    match command {
        CacheCommand::Install => {
            let urls = ctx.router.policy().precache_urls()?;
            ctx.router.install(&urls).await?;
            println!("Cached {} assets for offline use.", urls.len());
        }
        CacheCommand::Activate => {
            let deleted = ctx.router.activate()?;
            if deleted.is_empty() {
                println!("No old caches to remove.");
            }
            for name in deleted {
                println!("Removed cache {}", name);
            }
        }
    }
    Ok(())
}
