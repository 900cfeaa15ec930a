// Copyright 2021 Datafuse Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod default_table;
mod group_table;
mod key_index;
mod list_table;
mod traits;

pub use default_table::DefaultHashTable;
pub use group_table::HashTableGroup;
pub(crate) use key_index::KeyIndex;
pub use list_table::ListHashTable;
pub use traits::HashTable;
pub use traits::RowPtr;
