//! Runs the commands a `DashboardState` emits against a `StockPort`.

use std::collections::VecDeque;

use crate::domain::dashboard::{Command, DashboardState, Event, Mutation};
use crate::ports::stock_port::{StockPort, StockQuery};

/// Execute one command and turn its completion into the event that reports it.
pub async fn perform(stocks: &dyn StockPort, command: Command, fetch_limit: u32) -> Event {
    match command {
        Command::FetchStocks {
            generation,
            trade_code,
        } => {
            let query = StockQuery::first(fetch_limit, trade_code.as_deref());
            Event::StocksLoaded {
                generation,
                result: stocks.list_stocks(&query).await,
            }
        }
        Command::FetchTradeCodes => Event::CodesLoaded(stocks.list_trade_codes().await),
        Command::CreateRecord(payload) => Event::MutationDone {
            mutation: Mutation::Create,
            result: stocks.create_stock(&payload).await.map(|_| ()),
        },
        Command::UpdateRecord(record) => {
            let id = record.id;
            Event::MutationDone {
                mutation: Mutation::Update { id },
                result: stocks.update_stock(id, &record).await.map(|_| ()),
            }
        }
        Command::DeleteRecord(id) => Event::MutationDone {
            mutation: Mutation::Delete { id },
            result: stocks.delete_stock(id).await,
        },
    }
}

/// Apply `event`, then run every command it causes (and every command those
/// completions cause) one at a time until the state is quiet. Returns how
/// many commands ran.
pub async fn dispatch(
    state: &mut DashboardState,
    stocks: &dyn StockPort,
    fetch_limit: u32,
    event: Event,
) -> usize {
    let mut pending: VecDeque<Command> = state.update(event).into();
    let mut ran = 0;
    while let Some(command) = pending.pop_front() {
        ran += 1;
        let done = perform(stocks, command, fetch_limit).await;
        pending.extend(state.update(done));
    }
    ran
}

/// Apply `event` and run only the commands it issues directly, feeding their
/// completions back without following up on what those issue. For callers
/// that discard the refreshed view, such as a redirect after a mutation.
pub async fn dispatch_once(
    state: &mut DashboardState,
    stocks: &dyn StockPort,
    fetch_limit: u32,
    event: Event,
) -> usize {
    let commands = state.update(event);
    let ran = commands.len();
    for command in commands {
        let done = perform(stocks, command, fetch_limit).await;
        let follow_up = state.update(done);
        tracing::trace!(skipped = follow_up.len(), "follow-up commands dropped");
    }
    ran
}
