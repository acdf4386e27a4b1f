//! Write a tiny two-column dataset into the in-memory store and read it
//! back cluster-at-a-time.

use std::sync::Arc;

use ntkv::{
    ClusterDescriptor, ClusterGroupDescriptor, ClusterKey, ColumnRange, FooterInfo, HeaderInfo,
    MemStore, Page, PageInfo, PageKey, PageRange, PageSink, PageSource, ReadOptions, WriteOptions,
};
use ntkv_pages::meta::{self, META_VERSION};

fn main() -> ntkv::Result<()> {
    let store = Arc::new(MemStore::new());
    let uri = "daos://demo-pool/demo-cont";

    // Write: header, one cluster with two columns, page list, footer.
    let header = HeaderInfo {
        version: META_VERSION,
        name: "demo".to_string(),
        columns: vec![0, 1],
    };
    let mut sink = PageSink::new(Arc::clone(&store), "demo", uri, WriteOptions::default())?;
    sink.create(&meta::serialize_header(&header))?;

    let mut cluster = ClusterDescriptor::new(0, 0, 4);
    for (column, bytes) in [(0u64, b"ABCD".as_slice()), (1u64, b"EFGH".as_slice())] {
        let page = Page::new(bytes.to_vec(), bytes.len() as u32);
        let locator = sink.commit_page(column, &page)?;
        cluster.add_column(
            column,
            ColumnRange {
                first_element_index: 0,
                n_elements: bytes.len() as u64,
            },
            PageRange {
                pages: vec![PageInfo {
                    n_elements: bytes.len() as u32,
                    len: bytes.len() as u32,
                    locator,
                }],
            },
        );
    }
    let bytes_in_cluster = sink.commit_cluster(4)?;
    println!("cluster 0 carried {bytes_in_cluster} payload bytes");

    let page_list = meta::serialize_page_list(&[cluster]);
    let page_list_locator = sink.commit_cluster_group(&page_list)?;
    let footer = FooterInfo {
        version: META_VERSION,
        n_entries: 4,
        cluster_groups: vec![ClusterGroupDescriptor {
            group_id: 0,
            n_clusters: 1,
            page_list_len: page_list.len() as u32,
            page_list_locator,
        }],
    };
    sink.commit_dataset(&meta::serialize_footer(&footer))?;

    // Read: bootstrap from the anchor, then load the whole cluster as one
    // batched vector read.
    let source = PageSource::open(Arc::clone(&store), "demo", uri, ReadOptions::default())?;
    let descriptor = source.attach()?;
    println!(
        "attached '{}': {} clusters, {} entries",
        descriptor.name(),
        descriptor.n_clusters(),
        descriptor.n_entries()
    );

    let clusters = source.load_clusters(&[ClusterKey {
        cluster_id: 0,
        columns: vec![0, 1],
    }])?;
    for column in 0u64..2 {
        let sealed = clusters[0]
            .on_disk_page(&PageKey {
                column_id: column,
                page_no: 0,
            })
            .expect("page was loaded");
        println!("column {column}: {} sealed bytes", sealed.len());
    }
    Ok(())
}
