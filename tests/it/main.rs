mod test_csv_source;
mod test_stream;
