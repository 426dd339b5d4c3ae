//! Continuation-token plumbing shared by every paged store call.

use super::types::{Item, ItemPage, ListTablesRequest, QueryRequest, ScanRequest, TableNamePage};

/// A request that can resume from a continuation token.
pub trait PagedRequest: Clone + Send + Sync {
    type Token: Send;

    /// Sets the token the next call starts after.
    fn resume_from(&mut self, token: Self::Token);
}

/// A page returned by a paged store call.
///
/// `into_parts` normalizes an empty token to `None`: both mean "last page".
pub trait Page: Send {
    type Item: Send;
    type Token: Send;

    fn into_parts(self) -> (Vec<Self::Item>, Option<Self::Token>);
}

impl PagedRequest for ScanRequest {
    type Token = Item;

    fn resume_from(&mut self, token: Item) {
        self.exclusive_start_key = Some(token);
    }
}

impl PagedRequest for QueryRequest {
    type Token = Item;

    fn resume_from(&mut self, token: Item) {
        self.exclusive_start_key = Some(token);
    }
}

impl PagedRequest for ListTablesRequest {
    type Token = String;

    fn resume_from(&mut self, token: String) {
        self.exclusive_start_table_name = Some(token);
    }
}

impl Page for ItemPage {
    type Item = Item;
    type Token = Item;

    fn into_parts(self) -> (Vec<Item>, Option<Item>) {
        let token = self.last_evaluated_key.filter(|key| !key.is_empty());
        (self.items, token)
    }
}

impl Page for TableNamePage {
    type Item = String;
    type Token = String;

    fn into_parts(self) -> (Vec<String>, Option<String>) {
        let token = self.last_evaluated_table_name.filter(|name| !name.is_empty());
        (self.table_names, token)
    }
}
