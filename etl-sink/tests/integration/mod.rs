mod merge_flush_test;
mod regular_rows_test;
mod support;
mod upsert_delete_rows_test;
